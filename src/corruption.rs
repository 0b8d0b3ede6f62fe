//! Escalating text corruption for the transcript lines.

use crate::rng::RandomSource;

/// Prompt marker; left alone by both transforms.
pub(crate) const PROMPT: &str = ">";

const FOREIGN_WORDS: [&[&str]; 7] = [
    &[
        "viene", "pronto", "tiempo", "antes", "estado", "mejor", "nunca", "ahora", "llegar",
        "cual", "momento", "todavia",
    ],
    &[
        "vient", "bientot", "temps", "avant", "jamais", "mieux", "maintenant", "arriver", "quel",
        "moment",
    ],
    &[
        "kommt", "bald", "zeit", "niemals", "status", "besser", "jetzt", "kommen", "was", "moment",
    ],
    &[
        "viene", "presto", "tempo", "prima", "stato", "meglio", "adesso", "arrivare", "cosa",
        "momento",
    ],
    &[
        "vem", "logo", "tempo", "antes", "estado", "melhor", "agora", "chegar", "qual", "momento",
    ],
    &["скоро", "время", "статус", "лучше", "придет", "когда", "сейчас"],
    &["很快", "时间", "状态", "更好", "来了", "现在"],
];

const PLAIN_WORDS: [&str; 16] = [
    "coming", "soon", "time", "status", "better", "will", "before", "anyway", "what", "slightly",
    "than", "is", "ERROR", "FATAL", "WARNING", "SYSTEM",
];

const SYMBOL_GROUPS: [&str; 8] = [
    "─│┌┐└┘├┤┬┴┼╔╗╚╝║═╠╣╦╩╬",
    "░▒▓█▄▀▌▐■□▪▫",
    "±×÷≈≠≤≥∞∫√∑∏µ∂∆",
    "¢£¤¥§€₹₽¥₩",
    "àáâãäåæçèéêëìíîïñòóôõöøùúûüýÿ",
    "¡¢£¤¥¦§¨©ª«¬®¯°±²³´µ¶·¸¹º»¼½¾¿",
    "←↑→↓↔↕⇐⇑⇒⇓⇔⇕",
    "•○●◐◑◒◓◔◕◊◈◉",
];

const GLYPH_CLUSTERS: [&str; 23] = [
    "╔══╗", "║▓▓║", "╚══╝", "<<<>>>", "[][][]", "{•••}", "▲▼◄►", "◢◣◤◥", "♠♣♥♦", "░░░░", "▒▒▒▒",
    "▓▓▓▓", "████", "///\\\\\\", "~~~", "---", "===", "╭─╮", "│☺│", "╰─╯", "◆◇◆◇", "★☆★☆",
    "♪♫♪♫",
];

fn symbol(rng: &mut impl RandomSource) -> char {
    let total: usize = SYMBOL_GROUPS.iter().map(|g| g.chars().count()).sum();
    let mut i = rng.index(total);
    for group in SYMBOL_GROUPS {
        let n = group.chars().count();
        if i < n {
            return group.chars().nth(i).unwrap_or('░');
        }
        i -= n;
    }
    '░'
}

pub(crate) fn plain_word(rng: &mut impl RandomSource) -> &'static str {
    PLAIN_WORDS[rng.index(PLAIN_WORDS.len())]
}

pub(crate) fn foreign_word(rng: &mut impl RandomSource) -> &'static str {
    let lang = FOREIGN_WORDS[rng.index(FOREIGN_WORDS.len())];
    lang[rng.index(lang.len())]
}

pub(crate) fn glyph_cluster(rng: &mut impl RandomSource) -> &'static str {
    GLYPH_CLUSTERS[rng.index(GLYPH_CLUSTERS.len())]
}

/// Splits into prompt markers, whitespace runs and non-whitespace runs.
/// A `>` only stands alone when it starts a token.
fn tokenize(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        if c == '>' {
            out.push(&text[start..start + 1]);
            continue;
        }
        let ws = c.is_whitespace();
        let mut end = start + c.len_utf8();
        while let Some(&(i, n)) = chars.peek() {
            if n.is_whitespace() != ws {
                break;
            }
            end = i + n.len_utf8();
            chars.next();
        }
        out.push(&text[start..end]);
    }
    out
}

fn is_untouchable(text: &str) -> bool {
    text.trim().is_empty() || text == PROMPT
}

fn scramble_some(word: &str, rng: &mut impl RandomSource) -> String {
    word.chars()
        .map(|c| if rng.chance(0.5) { symbol(rng) } else { c })
        .collect()
}

fn scramble_all(word: &str, rng: &mut impl RandomSource) -> String {
    word.chars().map(|_| symbol(rng)).collect()
}

/// Mild corruption: keeps the line's shape, swaps words for plain or foreign
/// ones and sprinkles symbols. At least one plain and one foreign word are
/// forced in when the line has enough words to carry them.
pub(crate) fn controlled_corruption(text: &str, rng: &mut impl RandomSource) -> String {
    if is_untouchable(text) {
        return text.to_string();
    }
    let tokens = tokenize(text);
    // forced rolls stop once they fire; random picks don't count toward them
    let mut has_plain = false;
    let mut has_foreign = false;
    let mut placed_plain = false;
    let mut placed_foreign = false;
    let mut out: Vec<String> = Vec::with_capacity(tokens.len());
    let mut untouched_words = Vec::new();

    for tok in &tokens {
        if is_untouchable(tok) {
            out.push(tok.to_string());
            continue;
        }
        if !has_plain && rng.chance(0.3) {
            has_plain = true;
            placed_plain = true;
            out.push(plain_word(rng).to_string());
            continue;
        }
        if !has_foreign && rng.chance(0.3) {
            has_foreign = true;
            placed_foreign = true;
            out.push(foreign_word(rng).to_string());
            continue;
        }
        let roll = rng.unit();
        if roll < 0.2 {
            placed_plain = true;
            out.push(plain_word(rng).to_string());
        } else if roll < 0.4 {
            placed_foreign = true;
            out.push(foreign_word(rng).to_string());
        } else if roll < 0.6 {
            out.push(scramble_some(tok, rng));
        } else {
            untouched_words.push(out.len());
            out.push(tok.to_string());
        }
    }

    let mut spare = untouched_words.into_iter();
    if !placed_plain {
        if let Some(i) = spare.next() {
            out[i] = plain_word(rng).to_string();
        }
    }
    if !placed_foreign {
        if let Some(i) = spare.next() {
            out[i] = foreign_word(rng).to_string();
        }
    }
    out.concat()
}

/// Heavy corruption whose every stage scales with `intensity`.
pub(crate) fn chaos_corruption(text: &str, intensity: f32, rng: &mut impl RandomSource) -> String {
    if is_untouchable(text) {
        return text.to_string();
    }
    let intensity = intensity.clamp(0.0, 1.0);
    let mut result = text.to_string();

    if rng.chance(intensity) {
        result = tokenize(&result)
            .into_iter()
            .map(|tok| {
                if !tok.chars().all(char::is_whitespace) {
                    return tok.to_string();
                }
                let roll = rng.unit();
                if roll < 0.3 {
                    String::new()
                } else if roll < 0.6 {
                    " ".repeat(rng.index(5) + 1)
                } else if roll < 0.8 {
                    symbol(rng).to_string()
                } else {
                    " ".to_string()
                }
            })
            .collect();
    }

    if rng.chance(intensity * 0.7) {
        let len = result.chars().count();
        let at = rng.index(len.max(1));
        let byte = result.char_indices().nth(at).map_or(result.len(), |(b, _)| b);
        result.insert_str(byte, glyph_cluster(rng));
    }

    if rng.chance(intensity * 0.8) {
        let tail = (rng.unit() * 20.0 * intensity) as usize;
        for _ in 0..tail {
            result.push(symbol(rng));
        }
    }

    tokenize(&result)
        .into_iter()
        .map(|tok| {
            if tok == PROMPT {
                return if rng.chance(intensity) {
                    glyph_cluster(rng).to_string()
                } else {
                    tok.to_string()
                };
            }
            let roll = rng.unit();
            if roll < 0.15 * intensity {
                plain_word(rng).to_string()
            } else if roll < 0.3 * intensity {
                foreign_word(rng).to_string()
            } else if roll < 0.5 * intensity {
                glyph_cluster(rng).to_string()
            } else if roll < 0.8 * intensity {
                scramble_all(tok, rng)
            } else {
                tok.to_string()
            }
        })
        .collect()
}

/// A fresh garbage line for the chaos phase.
pub(crate) fn noise_line(rng: &mut impl RandomSource) -> String {
    let count = rng.index(20);
    let sep = if rng.chance(0.5) { " " } else { "" };
    let parts: Vec<String> = (0..count)
        .map(|_| {
            if rng.chance(0.3) {
                plain_word(rng).to_string()
            } else {
                symbol(rng).to_string()
            }
        })
        .collect();
    format!("> {}", parts.join(sep))
}

const DIAMOND: [&str; 8] = [
    "      ⣾⣿⣷      ",
    "    ⣾⣿⣿⣿⣷    ",
    "   ⣾⣿⣿⣿⣿⣿⣷   ",
    "  ⣾⣿⣿⣿⣿⣿⣿⣷  ",
    "  ⢿⣿⣿⣿⣿⣿⣿⡿  ",
    "   ⢿⣿⣿⣿⣿⡿   ",
    "    ⢿⣿⣿⡿    ",
    "      ⢿⡿      ",
];

const LOZENGE: [&str; 9] = [
    "       ◆       ",
    "      ◆◆◆      ",
    "     ◆◆◆◆◆     ",
    "    ◆◆◆◆◆◆◆    ",
    "   ◆◆◆◆◆◆◆◆◆   ",
    "    ◆◆◆◆◆◆◆    ",
    "     ◆◆◆◆◆     ",
    "      ◆◆◆      ",
    "       ◆       ",
];

const GRADIENT: [&str; 7] = [
    "░░▒▒▓▓████▓▓▒▒░░",
    "▒▒▓▓████████▓▓▒▒",
    "▓▓████████████▓▓",
    "████████████████",
    "▓▓████████████▓▓",
    "▒▒▓▓████████▓▓▒▒",
    "░░▒▒▓▓████▓▓▒▒░░",
];

const SPARKLE: [&str; 8] = [
    "    ✦･ﾟ✧*:･ﾟ✧    ",
    "  ✧･ﾟ: *✧･ﾟ:*  ",
    " *:･ﾟ✧*:･ﾟ✧* ",
    "✧･ﾟ: ORDER :･ﾟ✧",
    "✧･ﾟ: CHAOS :･ﾟ✧",
    " *:･ﾟ✧*:･ﾟ✧* ",
    "  ✧･ﾟ: *✧･ﾟ:*  ",
    "    ✦･ﾟ✧*:･ﾟ✧    ",
];

const STAR: [&str; 11] = [
    "     ╱|╲     ",
    "    ╱ | ╲    ",
    "   ╱  |  ╲   ",
    "  ╱   |   ╲  ",
    " ╱    |    ╲ ",
    "━━━━━━━━━━━━━",
    " ╲    |    ╱ ",
    "  ╲   |   ╱  ",
    "   ╲  |  ╱   ",
    "    ╲ | ╱    ",
    "     ╲|╱     ",
];

const BINARY_SHADES: [char; 6] = ['0', '1', '░', '▒', '▓', '█'];

/// One of six motifs shown while the page is in the art phase.
pub(crate) fn art_pattern(rng: &mut impl RandomSource) -> Vec<String> {
    let owned = |rows: &[&str]| rows.iter().map(|r| r.to_string()).collect();
    match rng.index(6) {
        0 => owned(&DIAMOND),
        1 => owned(&LOZENGE),
        2 => owned(&GRADIENT),
        3 => owned(&SPARKLE),
        4 => owned(&STAR),
        _ => (0..10)
            .map(|_| {
                (0..20)
                    .map(|_| {
                        if rng.chance(0.4) {
                            BINARY_SHADES[rng.index(BINARY_SHADES.len())]
                        } else {
                            ' '
                        }
                    })
                    .collect()
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{seeded, Scripted};

    #[test]
    fn tokenizer_splits_prompt_words_and_space() {
        assert_eq!(tokenize("> a  bc"), vec![">", " ", "a", "  ", "bc"]);
        assert_eq!(tokenize(">hi"), vec![">", "hi"]);
        assert_eq!(tokenize("a>b"), vec!["a>b"]);
        assert_eq!(tokenize("->x"), vec!["->x"]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn tokens_reassemble_input() {
        let line = "> status:  slightly better than 404 ├┤ 状态";
        assert_eq!(tokenize(line).concat(), line);
    }

    #[test]
    fn controlled_leaves_blank_and_prompt_alone() {
        let mut rng = seeded(1);
        for s in ["", "   ", ">"] {
            assert_eq!(controlled_corruption(s, &mut rng), s);
        }
    }

    #[test]
    fn chaos_leaves_blank_and_prompt_alone() {
        let mut rng = seeded(2);
        for i in [0.0, 0.5, 1.0] {
            for s in ["", "   ", ">"] {
                assert_eq!(chaos_corruption(s, i, &mut rng), s);
            }
        }
    }

    #[test]
    fn controlled_keeps_prompt_and_whitespace_structure() {
        let mut rng = seeded(9);
        for _ in 0..100 {
            let out = controlled_corruption("> coming soon is coming soon", &mut rng);
            assert!(out.starts_with("> "));
            // replacements never contain spaces, so all five separators survive
            assert_eq!(out.matches(' ').count(), 5);
        }
    }

    #[test]
    fn controlled_forces_plain_and_foreign_words() {
        // every roll lands in the "leave unchanged" band, so only the
        // fallback can introduce replacements
        let mut rng = Scripted::constant(0.95);
        let out = controlled_corruption("> aaa bbb ccc", &mut rng);
        let words: Vec<&str> = out.split(' ').collect();
        assert_eq!(words[0], ">");
        assert!(PLAIN_WORDS.contains(&words[1]));
        assert!(FOREIGN_WORDS.iter().any(|l| l.contains(&words[2])));
        assert_eq!(words[3], "ccc");
    }

    #[test]
    fn random_plain_word_does_not_use_up_the_forced_roll() {
        // aaa: both forced rolls miss, the random roll picks a plain word;
        // bbb: the forced plain roll still fires
        let mut rng = Scripted::new(&[0.5, 0.5, 0.1, 0.0, 0.1, 0.0, 0.0, 0.95]);
        assert_eq!(controlled_corruption("> aaa bbb", &mut rng), "> coming coming");
    }

    #[test]
    fn chaos_at_zero_intensity_is_identity() {
        let mut rng = seeded(4);
        let line = "> status: slightly better than 404";
        for _ in 0..50 {
            assert_eq!(chaos_corruption(line, 0.0, &mut rng), line);
        }
    }

    #[test]
    fn chaos_at_full_intensity_rewrites_most_tokens() {
        let mut rng = seeded(5);
        let line = "> status: slightly better than 404";
        let mut changed = 0;
        for _ in 0..50 {
            let out = chaos_corruption(line, 0.9, &mut rng);
            assert!(!out.is_empty());
            if out != line {
                changed += 1;
            }
        }
        assert!(changed > 45);
    }

    #[test]
    fn noise_line_has_prompt() {
        let mut rng = seeded(6);
        for _ in 0..20 {
            assert!(noise_line(&mut rng).starts_with("> "));
        }
    }

    #[test]
    fn every_art_pattern_is_non_empty() {
        for pick in 0..6 {
            let v = (pick as f64 + 0.5) / 6.0;
            let rows = art_pattern(&mut Scripted::new(&[v, 0.1, 0.7]));
            assert!(!rows.is_empty());
        }
    }

    #[test]
    fn symbol_covers_every_group() {
        let mut last = Scripted::constant(0.999_999);
        assert_eq!(symbol(&mut last), '◉');
        let mut first = Scripted::constant(0.0);
        assert_eq!(symbol(&mut first), '─');
    }
}
