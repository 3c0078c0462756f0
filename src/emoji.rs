use md5::{Digest, Md5};

/// Fixed symbol table for the `[emoji]` token. Selection is an index
/// computed from hashed bytes, never a process-wide RNG, so the same
/// content always maps to the same symbols. Entries may span multiple
/// codepoints (variation selectors).
pub(crate) const EMOJI_TABLE: [&str; 64] = [
    "\u{1F344}", // 🍄
    "\u{1F31F}", // 🌟
    "\u{1F308}", // 🌈
    "\u{1F525}", // 🔥
    "\u{1F4A7}", // 💧
    "\u{1F331}", // 🌱
    "\u{1F340}", // 🍀
    "\u{1F33B}", // 🌻
    "\u{1F34E}", // 🍎
    "\u{1F34B}", // 🍋
    "\u{1F349}", // 🍉
    "\u{1F347}", // 🍇
    "\u{1F352}", // 🍒
    "\u{1F95D}", // 🥝
    "\u{1F33D}", // 🌽
    "\u{1F950}", // 🥐
    "\u{1F98A}", // 🦊
    "\u{1F422}", // 🐢
    "\u{1F419}", // 🐙
    "\u{1F989}", // 🦉
    "\u{1F41D}", // 🐝
    "\u{1F98B}", // 🦋
    "\u{1F42C}", // 🐬
    "\u{1F984}", // 🦄
    "\u{1F438}", // 🐸
    "\u{1F43C}", // 🐼
    "\u{1F428}", // 🐨
    "\u{1F981}", // 🦁
    "\u{1F42F}", // 🐯
    "\u{1F993}", // 🦓
    "\u{1F418}", // 🐘
    "\u{1F99C}", // 🦜
    "\u{26A1}",          // ⚡
    "\u{2600}\u{FE0F}",  // ☀️
    "\u{1F319}",         // 🌙
    "\u{2B50}",          // ⭐
    "\u{2601}\u{FE0F}",  // ☁️
    "\u{2744}\u{FE0F}",  // ❄️
    "\u{1F30A}",         // 🌊
    "\u{1F342}",         // 🍂
    "\u{1F388}", // 🎈
    "\u{1F3A8}", // 🎨
    "\u{1F3B2}", // 🎲
    "\u{1F3AF}", // 🎯
    "\u{1F381}", // 🎁
    "\u{1F514}", // 🔔
    "\u{1F3B5}", // 🎵
    "\u{1F9E9}", // 🧩
    "\u{1F680}",         // 🚀
    "\u{26F5}",          // ⛵
    "\u{1F6B2}",         // 🚲
    "\u{1F6F8}",         // 🛸
    "\u{1F5FA}\u{FE0F}", // 🗺️
    "\u{1F3D4}\u{FE0F}", // 🏔️
    "\u{1F3DD}\u{FE0F}", // 🏝️
    "\u{1F30B}",         // 🌋
    "\u{1F5DD}\u{FE0F}", // 🗝️
    "\u{1F48E}",         // 💎
    "\u{1F9ED}",         // 🧭
    "\u{2699}\u{FE0F}",  // ⚙️
    "\u{1F52D}",         // 🔭
    "\u{1F9EA}",         // 🧪
    "\u{1F4E6}",         // 📦
    "\u{1FA81}",         // 🪁
];

/// Map `content` to `count` symbols from [`EMOJI_TABLE`].
///
/// The content is md5-hashed and successive 6-bit groups of the digest
/// (most-significant bit first) index into the table. When fewer than 6
/// bits remain the digest is re-hashed and the cursor restarts, so any
/// requested count terminates.
pub(crate) fn emoji_sequence(content: &[u8], count: usize) -> String {
    let mut digest: Vec<u8> = Md5::digest(content).to_vec();
    let mut out = String::new();
    let mut bit = 0;
    for _ in 0..count {
        if bit + 6 > digest.len() * 8 {
            digest = Md5::digest(&digest).to_vec();
            bit = 0;
        }
        out.push_str(EMOJI_TABLE[take_six_bits(&digest, bit)]);
        bit += 6;
    }
    out
}

/// Read the 6-bit group starting at bit offset `bit` (msb-first),
/// possibly straddling a byte boundary.
fn take_six_bits(bytes: &[u8], bit: usize) -> usize {
    let byte = bit / 8;
    let offset = bit % 8;
    let window = (u16::from(bytes[byte]) << 8)
        | u16::from(bytes.get(byte + 1).copied().unwrap_or(0));
    usize::from((window >> (10 - offset)) & 0x3f)
}
