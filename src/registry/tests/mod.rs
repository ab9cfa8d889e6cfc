use super::*;

const SAMPLE_REGISTRY: &str = "\
# emoji-test.txt
# Date: 2023-06-05, 21:39:54 GMT
# Version: 15.1

# group: Smileys & Emotion

# subgroup: face-smiling
1F600                                                  ; fully-qualified     # 😀 E1.0 grinning face
1F603                                                  ; fully-qualified     # 😃 E0.6 grinning face with big eyes

# subgroup: symbol-other
00A9 FE0F                                              ; fully-qualified     # ©️ E0.6 copyright
00A9                                                   ; unqualified         # © E0.6 copyright
263A FE0F                                              ; fully-qualified     # ☺️ E0.6 smiling face
263A                                                   ; unqualified         # ☺ E0.6 smiling face

# subgroup: country-flag
1F1FA 1F1F8                                            ; fully-qualified     # 🇺🇸 E2.0 flag: United States
1F1E8 1F1EE                                            ; fully-qualified     # 🇨🇮 E2.0 flag: Côte d’Ivoire

# subgroup: skin-tone
1F3FB                                                  ; component           # 🏻 E1.0 light skin tone

#EOF
";

fn key(s: &str) -> CodepointKey {
    CodepointKey::parse(s).unwrap()
}

#[test]
fn test_parse_line_extracts_fields() {
    let line = "1F600                                                  ; fully-qualified     # 😀 E1.0 grinning face";
    let entry = EmojiNameEntry::parse_line(line).unwrap();

    assert_eq!(entry.key, key("1f600"));
    assert_eq!(entry.qualification, Qualification::FullyQualified);
    assert_eq!(entry.display_name, "grinning face");
}

#[test]
fn test_parse_line_multi_codepoint() {
    let line = "1F468 200D 1F469 200D 1F467 ; fully-qualified # 👨‍👩‍👧 E2.0 family: man, woman, girl";
    let entry = EmojiNameEntry::parse_line(line).unwrap();

    assert_eq!(entry.key, key("1f468-200d-1f469-200d-1f467"));
    assert_eq!(entry.display_name, "family: man, woman, girl");
}

#[test]
fn test_parse_line_tolerates_compact_spacing() {
    let entry = EmojiNameEntry::parse_line("1f600;fully-qualified#😀 E1.0 grinning face  ").unwrap();

    assert_eq!(entry.key, key("1f600"));
    assert_eq!(entry.display_name, "grinning face");
}

#[test]
fn test_parse_line_skips_non_data_lines() {
    let lines = [
        "",
        "# group: Smileys & Emotion",
        "#EOF",
        "# Status Counts",
        "1F600 ; fully-qualified",
        "1F600 ; sparkly # 😀 E1.0 grinning face",
        "XYZ ; fully-qualified # 😀 E1.0 grinning face",
        "1F600 ; fully-qualified # 😀 1.0 grinning face",
        "1F600 ; fully-qualified # 😀 E1.0",
    ];
    for line in lines {
        assert!(
            EmojiNameEntry::parse_line(line).is_none(),
            "line should not parse: {line:?}"
        );
    }
}

#[test]
fn test_qualification_round_trips_through_str() {
    for q in [
        Qualification::FullyQualified,
        Qualification::MinimallyQualified,
        Qualification::Unqualified,
        Qualification::Component,
    ] {
        assert_eq!(q.as_str().parse::<Qualification>().unwrap(), q);
    }
}

#[test]
fn test_slugify_examples() {
    assert_eq!(slugify("grinning face"), "grinning-face");
    assert_eq!(slugify("flag: United States"), "flag-united-states");
    assert_eq!(slugify("family: man, woman, girl"), "family-man-woman-girl");
    assert_eq!(slugify("man’s shoe"), "mans-shoe");
    assert_eq!(slugify("Japanese “here” button"), "japanese-here-button");
    assert_eq!(slugify("1st place medal"), "1st-place-medal");
    assert_eq!(slugify("  A  button (blood type)  "), "a-button-blood-type");
    assert_eq!(slugify("flag: Côte d’Ivoire"), "flag-c-te-divoire");
    assert_eq!(slugify(""), "");
    assert_eq!(slugify("::--''"), "");
}

#[test]
fn test_slugify_is_deterministic_and_well_formed() {
    let names = [
        "grinning face",
        "woman: red hair",
        "keycap: #",
        "keycap: *",
        "piñata",
        "person in lotus position: medium-dark skin tone",
        "Mrs. Claus",
        "   ",
        "ＡＢＣ",
    ];
    for name in names {
        let first = slugify(name);
        assert_eq!(first, slugify(name), "slug must be stable for {name:?}");
        if !first.is_empty() {
            assert!(
                first
                    .split('-')
                    .all(|part| !part.is_empty()
                        && part.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())),
                "slug {first:?} for {name:?} is not [a-z0-9]+(-[a-z0-9]+)*"
            );
        }
    }
}

#[test]
fn test_name_table_from_sample() {
    let table = NameTable::parse(SAMPLE_REGISTRY);

    assert_eq!(table.get(&key("1f600")), Some("grinning-face"));
    assert_eq!(table.get(&key("1f1fa-1f1f8")), Some("flag-united-states"));
    assert_eq!(table.get(&key("00a9-fe0f")), Some("copyright"));
    assert_eq!(table.get(&key("00a9")), Some("copyright"));
    assert_eq!(table.get(&key("1f3fb")), Some("light-skin-tone"));
    assert_eq!(table.get(&key("1f4a9")), None);

    let stats = table.stats();
    assert_eq!(stats.entries, 9);
    assert_eq!(stats.keys, table.len());
    assert!(stats.lines > stats.entries);
}

#[test]
fn test_fully_qualified_wins_after_unqualified() {
    let text = "\
2764 ; unqualified # ❤ E0.6 heavy heart
2764 ; fully-qualified # ❤️ E0.6 red heart
";
    let table = NameTable::parse(text);
    assert_eq!(table.get(&key("2764")), Some("red-heart"));
}

#[test]
fn test_fully_qualified_wins_before_unqualified() {
    let text = "\
2764 ; fully-qualified # ❤️ E0.6 red heart
2764 ; unqualified # ❤ E0.6 heavy heart
";
    let table = NameTable::parse(text);
    assert_eq!(table.get(&key("2764")), Some("red-heart"));
}

#[test]
fn test_first_non_fully_qualified_entry_is_kept() {
    let text = "\
1F441 200D 1F5E8 ; unqualified # 👁‍🗨 E2.0 eye in speech bubble
1F441 200D 1F5E8 ; minimally-qualified # 👁‍🗨 E2.0 eye bubble
";
    let table = NameTable::parse(text);
    assert_eq!(
        table.get(&key("1f441-200d-1f5e8")),
        Some("eye-in-speech-bubble")
    );
}

#[test]
fn test_name_table_from_iterator() {
    let table: NameTable = [(key("1f600"), "grinning-face".to_string())]
        .into_iter()
        .collect();
    assert_eq!(table.len(), 1);
    assert!(!table.is_empty());
    assert_eq!(table.get(&key("1f600")), Some("grinning-face"));
}
