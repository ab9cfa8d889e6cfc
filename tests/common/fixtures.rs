//! Registry text and image fixtures

/// Small registry excerpt in the `emoji-test.txt` line format
pub const REGISTRY_EXCERPT: &str = "\
# emoji-test.txt
# This file provides data for testing which emoji forms should be in keyboards.

# group: Smileys & Emotion

# subgroup: face-smiling
1F600                                                  ; fully-qualified     # 😀 E1.0 grinning face
1F601                                                  ; fully-qualified     # 😁 E0.6 beaming face with smiling eyes

# subgroup: emotion
2764 FE0F                                              ; fully-qualified     # ❤️ E0.6 red heart
2764                                                   ; unqualified         # ❤ E0.6 red heart

# group: Symbols

# subgroup: other-symbol
00A9 FE0F                                              ; fully-qualified     # ©️ E0.6 copyright
00A9                                                   ; unqualified         # © E0.6 copyright sign

# subgroup: skin-tone
1F3FB                                                  ; component           # 🏻 E1.0 light skin tone

# Status Counts
# fully-qualified : 4
# unqualified : 2
# component : 1

#EOF
";

/// Bytes large enough to pass the placeholder threshold
pub fn fake_png() -> Vec<u8> {
    let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
    bytes.resize(3000, 0);
    bytes
}
