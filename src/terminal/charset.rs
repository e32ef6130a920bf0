/// Character set identifiers designatable into the G0..G3 slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    #[default]
    Ascii,
    /// UK Latin-1 (96-character "A").
    Uk,
    /// DEC Special Line Drawing.
    LineDraw,
    /// DEC Technical.
    Tech,
    /// OEM codepage 437.
    Oem,
    /// DEC user-preferred supplemental (resolved through DECAUPSS).
    DecSupp,
    /// DEC Supplementary Graphic (VT300).
    DecSpgr,
    // NRCS sets
    Dutch,
    Finnish,
    French,
    FrenchCanadian,
    German,
    Italian,
    Norwegian,
    Portuguese,
    Spanish,
    Swedish,
    Swiss,
    NrcsGreek,
    NrcsHebrew,
    NrcsTurkish,
    // 96-character ISO sets
    IsoLatinCyrillic,
    IsoGreek,
    IsoHebrew,
    IsoLatin5,
    // DEC supplemental variants
    DecGreek,
    DecHebrew,
    DecTurkish,
    DecCyrillic,
    /// VT52 graphics submode drawing set.
    Vt52Draw,
}

/// Result of mapping one byte through the active charset: the codepoint
/// plus the self-drawn glyph substitution code and font override, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapped {
    pub ch: char,
    pub graph: u8,
    pub font: u8,
}

impl Mapped {
    fn plain(ch: char) -> Self {
        Self {
            ch,
            graph: 0,
            font: 0,
        }
    }
}

/// Look up a charset designation. `nrc_code` packs an optional
/// intermediate byte with the final byte (`(inter << 8) | final`);
/// `want_96` selects the 96-character designation space (`-./`);
/// NRC-only sets require `nrc_enabled` (DECNRCM).
pub fn lookup_cset(nrc_code: u16, want_96: bool, nrc_enabled: bool) -> Option<Charset> {
    // (designation, 94-char, 96-char, needs NRC enabling, charset)
    const TABLE: &[(u16, bool, bool, bool, Charset)] = &[
        (b'B' as u16, true, false, false, Charset::Ascii),
        (b'A' as u16, true, true, false, Charset::Uk),
        (b'0' as u16, true, false, false, Charset::LineDraw),
        (b'>' as u16, true, false, false, Charset::Tech),
        (b'U' as u16, true, false, false, Charset::Oem),
        (b'<' as u16, true, false, false, Charset::DecSupp),
        (pair(b'%', b'5'), true, false, false, Charset::DecSpgr),
        (b'4' as u16, true, false, true, Charset::Dutch),
        (b'C' as u16, true, false, true, Charset::Finnish),
        (b'5' as u16, true, false, true, Charset::Finnish),
        (b'R' as u16, true, false, true, Charset::French),
        (b'f' as u16, true, false, true, Charset::French),
        (b'Q' as u16, true, false, true, Charset::FrenchCanadian),
        (b'9' as u16, true, false, true, Charset::FrenchCanadian),
        (b'K' as u16, true, false, true, Charset::German),
        (b'Y' as u16, true, false, true, Charset::Italian),
        (b'`' as u16, true, false, true, Charset::Norwegian),
        (b'E' as u16, true, false, true, Charset::Norwegian),
        (b'6' as u16, true, false, true, Charset::Norwegian),
        (pair(b'%', b'6'), true, false, true, Charset::Portuguese),
        (b'Z' as u16, true, false, true, Charset::Spanish),
        (b'H' as u16, true, false, true, Charset::Swedish),
        (b'7' as u16, true, false, true, Charset::Swedish),
        (b'=' as u16, true, false, true, Charset::Swiss),
        // 96-character sets
        (b'L' as u16, false, true, false, Charset::IsoLatinCyrillic),
        (b'F' as u16, false, true, false, Charset::IsoGreek),
        (b'H' as u16, false, true, false, Charset::IsoHebrew),
        (b'M' as u16, false, true, false, Charset::IsoLatin5),
        (pair(b'"', b'?'), true, false, false, Charset::DecGreek),
        (pair(b'"', b'4'), true, false, false, Charset::DecHebrew),
        (pair(b'%', b'0'), true, false, false, Charset::DecTurkish),
        (pair(b'&', b'4'), true, false, false, Charset::DecCyrillic),
        (pair(b'"', b'>'), true, false, true, Charset::NrcsGreek),
        (pair(b'%', b'='), true, false, true, Charset::NrcsHebrew),
        (pair(b'%', b'2'), true, false, true, Charset::NrcsTurkish),
    ];
    for &(design, is94, is96, needs_nrc, cs) in TABLE {
        let kind_ok = if want_96 { is96 } else { is94 };
        if design == nrc_code && kind_ok && (!needs_nrc || nrc_enabled) {
            return Some(cs);
        }
    }
    None
}

const fn pair(a: u8, b: u8) -> u16 {
    ((a as u16) << 8) | b as u16
}

// NRCS replacement positions within ASCII.
const NRC_POSITIONS: &[u8] = b"#@[\\]^_`{|}~";

fn nrc(c: u8, ch: char, map: &str) -> char {
    match NRC_POSITIONS.iter().position(|&p| p == c) {
        Some(i) => map.chars().nth(i).unwrap_or(ch),
        None => ch,
    }
}

fn from_table(c: u8, base: u8, table: &str) -> char {
    let idx = (c - base) as usize;
    let ch = table.chars().nth(idx).unwrap_or('\u{FFFD}');
    if ch == '\u{FFFD}' {
        '\u{FFFD}'
    } else {
        ch
    }
}

// DEC Special Line Drawing glyphs for 0x60..0x7E.
const LINEDRAW: &str = "◆▒␉␌␍␊°±␤␋┘┐┌└┼⎺⎻─⎼⎽├┤┴┬│≤≥π≠£·";

// Self-drawn line segment codes for j..x (up|down|left|right nibble, or
// scan-line codes in the high nibble).
const LINEDRAW_CODE: [u8; 31] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
    0b1001, 0b1100, 0b0110, 0b0011, 0b1111, // ┘┐┌└┼
    0x10, 0x20, 0b1010, 0x40, 0x50, // ⎺⎻─⎼⎽
    0b0111, 0b1101, 0b1011, 0b1110, 0b0101, // ├┤┴┬│
    0, 0, 0, 0, 0, 0,
];

// DEC Technical charset for 0x21..0x7E.
const TECH: &str = "⎷┌─⌠⌡│⎡⎣⎤⎦⎧⎩⎫⎭⎨⎬╶╶╲╱╴╴╳\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}≤≠≥∫∴∝∞÷  ΦΓ∼≃Θ×Λ⇔⇒≡ΠΨ\u{FFFD}Σ\u{FFFD}\u{FFFD}√ΩΞΥ⊂⊃∩∪∧∨¬αβχδεφγηιθκλ\u{FFFD}ν∂πψρστ\u{FFFD}ƒωξυζ←↑→↓";

// Self-drawn segment codes for technical charset pieces.
const TECHDRAW_CODE: [u8; 23] = [
    0xE, // square root base
    0, 0, 0, 0, 0, //
    0x8, 0x9, 0xA, 0xB, // square bracket corners
    0, 0, 0, 0, // curly bracket hooks
    0, 0, // curly bracket middle pieces
    0x1, 0x2, 0, 0, 0x5, 0x6, 0x7, // sum segments
];

// DEC Supplemental Graphic for 0x21..0x7E.
const DEC_SUPP: &str = "¡¢£\u{FFFD}¥\u{FFFD}§¤©ª«\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}°±²³\u{FFFD}µ¶·\u{FFFD}¹º»¼½\u{FFFD}¿ÀÁÂÃÄÅÆÇÈÉÊËÌÍÎÏ\u{FFFD}ÑÒÓÔÕÖŒØÙÚÛÜŸ\u{FFFD}ßàáâãäåæçèéêëìíîï\u{FFFD}ñòóôõöœøùúûüÿ\u{FFFD}";

// 96-character sets for 0x20..0x7F.
const UK_LATIN1: &str = " ¡¢£¤¥¦§¨©ª«¬\u{AD}®¯°±²³´µ¶·¸¹º»¼½¾¿ÀÁÂÃÄÅÆÇÈÉÊËÌÍÎÏÐÑÒÓÔÕÖ×ØÙÚÛÜÝÞßàáâãäåæçèéêëìíîïðñòóôõö÷øùúûüýþÿ";
const ISO_CYRILLIC: &str = " ЁЂЃЄЅІЇЈЉЊЋЌ\u{AD}ЎЏАБВГДЕЖЗИЙКЛМНОПРСТУФХЦЧШЩЪЫЬЭЮЯабвгдежзийклмнопрстуфхцчшщъыьэюя№ёђѓєѕіїјљњћќ§ўџ";
const ISO_GREEK: &str = " ‘’£€₯¦§¨©ͺ«¬\u{AD}\u{FFFD}―°±²³΄΅Ά·ΈΉΊ»Ό½ΎΏΐΑΒΓΔΕΖΗΘΙΚΛΜΝΞΟΠΡ\u{FFFD}ΣΤΥΦΧΨΩΪΫάέήίΰαβγδεζηθικλμνξοπρςστυφχψωϊϋόύώ";
const ISO_HEBREW: &str = " \u{FFFD}¢£¤¥¦§¨©×«¬\u{AD}®¯°±²³´µ¶·¸¹÷»¼½¾\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}‗אבגדהוזחטיךכלםמןנסעףפץצקרשת\u{FFFD}\u{FFFD}\u{200E}\u{200F}";
const ISO_LATIN5: &str = " ¡¢£¤¥¦§¨©ª«¬\u{AD}®¯°±²³´µ¶·¸¹º»¼½¾¿ÀÁÂÃÄÅÆÇÈÉÊËÌÍÎÏĞÑÒÓÔÕÖ×ØÙÚÛÜİŞßàáâãäåæçèéêëìíîïğñòóôõö÷øùúûüışÿ";
const DEC_GREEK: &str = " ¡¢£\u{FFFD}¥\u{FFFD}§¤©ª«\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}°±²³\u{FFFD}µ¶·\u{FFFD}¹º»¼½\u{FFFD}¿ϊΑΒΓΔΕΖΗΘΙΚΛΜΝΞΟ\u{FFFD}ΠΡΣΤΥΦΧΨΩάέήί\u{FFFD}όϋαβγδεζηθικλμνξο\u{FFFD}πρστυφχψωςύώ΄\u{FFFD}";
const DEC_HEBREW: &str = " ¡¢£\u{FFFD}¥\u{FFFD}§¨©×«\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}°±²³\u{FFFD}µ¶·\u{FFFD}¹÷»¼½\u{FFFD}¿\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}אבגדהוזחטיךכלםמןנסעףפץצקרשת\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}";
const DEC_TURKISH: &str = " ¡¢£\u{FFFD}¥\u{FFFD}§¨©ª«\u{FFFD}\u{FFFD}İ\u{FFFD}°±²³\u{FFFD}µ¶·\u{FFFD}¹º»¼½ı¿ÀÁÂÃÄÅÆÇÈÉÊËÌÍÎÏĞÑÒÓÔÕÖŒØÙÚÛÜŸŞßàáâãäåæçèéêëìíîïğñòóôõöœøùúûüÿş";
const DEC_CYRILLIC: &str = " \u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}юабцдефгхийклмнопярстужвьызшэщчъЮАБЦДЕФГХИЙКЛМНОПЯРСТУЖВЬЫЗШЭЩЧЪ";
const NRCS_GREEK: &str = " !\"#$%&'()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_`ΑΒΓΔΕΖΗΘΙΚΛΜΝΧΟΠΡΣΤΥΦΞΨΩ\u{FFFD}\u{FFFD}{|}~";
const NRCS_HEBREW: &str = " !\"#$%&'()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_אבגדהוזחטיךכלםמןנסעףפץצקרשת{|}~";
const NRCS_TURKISH: &str = " !\"#$%ğ'()*+,-./0123456789:;<=>?İABCDEFGHIJKLMNOPQRSTUVWXYZŞÖÇÜ_Ğabcdefghijklmnopqrstuvwxyzşöçü";

// VT52 graphics submode glyphs for 0x5E..0x7E.
const VT52_DRAW: &str = "^ \u{FFFD}▮⅟³⁵⁷°±→…÷↓⎺⎺⎻⎻⎼⎼⎽⎽₀₁₂₃₄₅₆₇₈₉¶";

/// Map a GL byte (0x20..0x7F after any GR fold) through a charset.
pub fn map_char(cset: Charset, c: u8) -> Mapped {
    let ch = c as char;
    match cset {
        Charset::Ascii => Mapped::plain(ch),
        Charset::Uk => {
            if (0x20..=0x7F).contains(&c) {
                Mapped::plain(from_table(c, 0x20, UK_LATIN1))
            } else {
                Mapped::plain(ch)
            }
        }
        Charset::LineDraw => {
            if (0x60..=0x7E).contains(&c) {
                let glyph = from_table(c, 0x60, LINEDRAW);
                let mut code = LINEDRAW_CODE[(c - 0x60) as usize];
                let mut font = 0;
                if code != 0 {
                    font = 11;
                    if code >> 4 != 0 {
                        code >>= 4;
                        font = 12;
                    }
                }
                Mapped {
                    ch: glyph,
                    graph: code,
                    font,
                }
            } else {
                Mapped::plain(ch)
            }
        }
        Charset::Tech => {
            if (0x21..=0x7E).contains(&c) {
                let glyph = from_table(c, 0x21, TECH);
                let graph = if c <= 0x37 {
                    TECHDRAW_CODE[(c - 0x21) as usize]
                } else if c == 0x44 {
                    0xC
                } else if c == 0x45 {
                    0xD
                } else {
                    0
                };
                Mapped {
                    ch: glyph,
                    graph,
                    font: 0,
                }
            } else {
                Mapped::plain(ch)
            }
        }
        Charset::Oem => Mapped::plain(cp437_char(c)),
        Charset::DecSupp | Charset::DecSpgr => {
            if (0x21..=0x7E).contains(&c) {
                Mapped::plain(from_table(c, 0x21, DEC_SUPP))
            } else {
                Mapped::plain(ch)
            }
        }
        Charset::Dutch => Mapped::plain(nrc(c, ch, "£¾ĳ½|^_`¨ƒ¼´")),
        Charset::Finnish => Mapped::plain(nrc(c, ch, "#@ÄÖÅÜ_éäöåü")),
        Charset::French => Mapped::plain(nrc(c, ch, "£à°ç§^_`éùè¨")),
        Charset::FrenchCanadian => Mapped::plain(nrc(c, ch, "#àâçêî_ôéùèû")),
        Charset::German => Mapped::plain(nrc(c, ch, "#§ÄÖÜ^_`äöüß")),
        Charset::Italian => Mapped::plain(nrc(c, ch, "£§°çé^_ùàòèì")),
        Charset::Norwegian => Mapped::plain(nrc(c, ch, "#ÄÆØÅÜ_äæøåü")),
        Charset::Portuguese => Mapped::plain(nrc(c, ch, "#@ÃÇÕ^_`ãçõ~")),
        Charset::Spanish => Mapped::plain(nrc(c, ch, "£§¡Ñ¿^_`°ñç~")),
        Charset::Swedish => Mapped::plain(nrc(c, ch, "#ÉÄÖÅÜ_éäöåü")),
        Charset::Swiss => Mapped::plain(nrc(c, ch, "ùàéçêîèôäöüû")),
        Charset::IsoLatinCyrillic => map_96(c, ch, ISO_CYRILLIC),
        Charset::IsoGreek => map_96(c, ch, ISO_GREEK),
        Charset::IsoHebrew => map_96(c, ch, ISO_HEBREW),
        Charset::IsoLatin5 => map_96(c, ch, ISO_LATIN5),
        Charset::DecGreek => map_96(c, ch, DEC_GREEK),
        Charset::DecHebrew => map_96(c, ch, DEC_HEBREW),
        Charset::DecTurkish => map_96(c, ch, DEC_TURKISH),
        Charset::DecCyrillic => map_96(c, ch, DEC_CYRILLIC),
        Charset::NrcsGreek => map_96(c, ch, NRCS_GREEK),
        Charset::NrcsHebrew => map_96(c, ch, NRCS_HEBREW),
        Charset::NrcsTurkish => map_96(c, ch, NRCS_TURKISH),
        Charset::Vt52Draw => {
            if (0x5E..=0x7E).contains(&c) {
                let glyph = from_table(c, 0x5E, VT52_DRAW);
                let (graph, font) = if (b'l'..=b's').contains(&c) {
                    (c - b'l' + 1, 13)
                } else if (b'c'..=b'e').contains(&c) {
                    (0xF, 0)
                } else {
                    (0, 0)
                };
                Mapped {
                    ch: glyph,
                    graph,
                    font,
                }
            } else {
                Mapped::plain(ch)
            }
        }
    }
}

fn map_96(c: u8, ch: char, table: &str) -> Mapped {
    if (0x20..=0x7F).contains(&c) {
        Mapped::plain(from_table(c, 0x20, table))
    } else {
        Mapped::plain(ch)
    }
}

// CP437 glyphs for the control range (used by OEM ACS modes).
const CP437_LOW: &str = " ☺☻♥♦♣♠•◘○◙♂♀♪♫☼►◄↕‼¶§▬↨↑↓→←∟↔▲▼";

// CP437 glyphs for 0x80..0xFF.
const CP437_HIGH: &str = "ÇüéâäàåçêëèïîìÄÅÉæÆôöòûùÿÖÜ¢£¥₧ƒáíóúñÑªº¿⌐¬½¼¡«»░▒▓│┤╡╢╖╕╣║╗╝╜╛┐└┴┬├─┼╞╟╚╔╩╦╠═╬╧╨╤╥╙╘╒╓╫╪┘┌█▄▌▐▀αßΓπΣσµτΦΘΩδ∞φε∩≡±≥≤⌠⌡÷≈°∙·√ⁿ²■\u{A0}";

/// Map a raw byte to its OEM (CP437) glyph, including the control-range
/// graphics used by SGR 11/12.
pub fn cp437_char(c: u8) -> char {
    match c {
        0x00..=0x1F => CP437_LOW.chars().nth(c as usize).unwrap_or(' '),
        0x7F => '⌂',
        0x80..=0xFF => CP437_HIGH
            .chars()
            .nth((c - 0x80) as usize)
            .unwrap_or('\u{FFFD}'),
        _ => c as char,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn designations_resolve() {
        assert_eq!(lookup_cset(b'B' as u16, false, false), Some(Charset::Ascii));
        assert_eq!(
            lookup_cset(b'0' as u16, false, false),
            Some(Charset::LineDraw)
        );
        assert_eq!(lookup_cset(b'>' as u16, false, false), Some(Charset::Tech));
        // NRC sets need DECNRCM
        assert_eq!(lookup_cset(b'K' as u16, false, false), None);
        assert_eq!(
            lookup_cset(b'K' as u16, false, true),
            Some(Charset::German)
        );
        // 'H' is Swedish in the 94-space but ISO Hebrew in the 96-space
        assert_eq!(
            lookup_cset(b'H' as u16, true, false),
            Some(Charset::IsoHebrew)
        );
        assert_eq!(
            lookup_cset(pair(b'%', b'5'), false, false),
            Some(Charset::DecSpgr)
        );
    }

    #[test]
    fn linedraw_maps_q_and_x() {
        assert_eq!(map_char(Charset::LineDraw, b'q').ch, '─');
        assert_eq!(map_char(Charset::LineDraw, b'x').ch, '│');
        assert_eq!(map_char(Charset::LineDraw, b'a').ch, '▒');
        // plain ASCII passes through below 0x60
        assert_eq!(map_char(Charset::LineDraw, b'A').ch, 'A');
    }

    #[test]
    fn linedraw_graph_codes() {
        let m = map_char(Charset::LineDraw, b'n'); // ┼
        assert_eq!(m.graph, 0b1111);
        assert_eq!(m.font, 11);
        let m = map_char(Charset::LineDraw, b'o'); // ⎺ scan line
        assert_eq!(m.graph, 0x1);
        assert_eq!(m.font, 12);
    }

    #[test]
    fn nrc_german() {
        assert_eq!(map_char(Charset::German, b'[').ch, 'Ä');
        assert_eq!(map_char(Charset::German, b'~').ch, 'ß');
        assert_eq!(map_char(Charset::German, b'a').ch, 'a');
    }

    #[test]
    fn uk_latin1_is_full_96() {
        assert_eq!(map_char(Charset::Uk, 0x23).ch, '£');
        assert_eq!(map_char(Charset::Uk, 0x41).ch, 'Á');
    }

    #[test]
    fn cp437_box_drawing() {
        assert_eq!(cp437_char(0xC9), '╔');
        assert_eq!(cp437_char(0x01), '☺');
        assert_eq!(cp437_char(b'a'), 'a');
    }

    #[test]
    fn tech_charset_sqrt() {
        assert_eq!(map_char(Charset::Tech, 0x21).ch, '⎷');
        assert_eq!(map_char(Charset::Tech, 0x21).graph, 0xE);
    }
}
