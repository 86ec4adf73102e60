use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::{AliasPair, Command, ExpenseEntry, ParticipantSpec};

// "b 120 siêu thị", "A 317 ăn", "D 134k tiền điện", "b 1.200 @ab", "b 120ăn trưa".
// A `k` only counts as the thousands suffix when a space or the line end follows.
static ENTRY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([a-zA-Z])\s+(-?\d[\d.,]*)\s*(?:[kK](?:\s+|$))?(.*)$")
        .expect("valid entry regex")
});

/// Largest accepted magnitude for one entry, in thousands.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

pub const SETMAP_USAGE: &str = "Cú pháp: /setmap b=Bình;a=An;d=Duy";

/// Rejections that are answered with a usage hint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("{}", SETMAP_USAGE)]
    SetMapUsage,
    #[error("Mỗi cặp dạng x=Tên (x là 1 ký tự).")]
    SetMapPair,
}

/// Parses one chat message. `Ok(None)` means the message is not for us.
pub fn parse_message(text: &str) -> Result<Option<Command>, ParseError> {
    let trimmed = text.trim();
    match trimmed.strip_prefix('/') {
        Some(rest) => parse_command(rest),
        None => Ok(parse_entry(text).map(Command::Entry)),
    }
}

fn parse_command(rest: &str) -> Result<Option<Command>, ParseError> {
    let mut parts = rest.splitn(2, char::is_whitespace);
    let head = parts.next().unwrap_or_default();
    let args = parts.next().unwrap_or_default();

    // "/tongket@my_bot" in group chats
    let name = head.split('@').next().unwrap_or_default().to_lowercase();

    let command = match name.as_str() {
        "start" | "help" => Command::Start,
        "setmap" => Command::SetMap(parse_setmap(args)?),
        "tongket" => Command::Summary,
        "batdau" => Command::NewPeriod,
        _ => return Ok(None),
    };
    Ok(Some(command))
}

/// Parses an expense line such as `b 120k siêu thị @ab`.
pub fn parse_entry(text: &str) -> Option<ExpenseEntry> {
    let caps = ENTRY_RE.captures(text.trim_end())?;

    let initial = caps.get(1)?.as_str().to_lowercase();
    let digits: String = caps
        .get(2)?
        .as_str()
        .chars()
        .filter(|c| *c != '.' && *c != ',')
        .collect();
    let amount: i64 = digits.parse().ok()?;
    if amount.abs() > MAX_AMOUNT {
        return None;
    }

    let raw_note = caps.get(3).map(|m| m.as_str()).unwrap_or_default().trim();
    let (note, participants) = split_participants(raw_note);

    Some(ExpenseEntry {
        initial,
        amount,
        note,
        participants,
    })
}

/// Strips a trailing `@initials` token from the note.
fn split_participants(note: &str) -> (String, ParticipantSpec) {
    let (body, last) = match note.rsplit_once(char::is_whitespace) {
        Some((body, last)) => (body.trim_end(), last),
        None => ("", note),
    };

    let Some(tag) = last.strip_prefix('@') else {
        return (note.to_string(), ParticipantSpec::Everyone);
    };

    if tag == "*" || tag.eq_ignore_ascii_case("all") {
        return (body.to_string(), ParticipantSpec::Everyone);
    }

    if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphabetic()) {
        return (note.to_string(), ParticipantSpec::Everyone);
    }

    let mut initials: Vec<String> = Vec::new();
    for c in tag.chars() {
        let initial = c.to_ascii_lowercase().to_string();
        if !initials.contains(&initial) {
            initials.push(initial);
        }
    }
    (body.to_string(), ParticipantSpec::Initials(initials))
}

/// Parses the argument of `/setmap`: `b=Bình;a=An;d=Duy`.
pub fn parse_setmap(args: &str) -> Result<Vec<AliasPair>, ParseError> {
    let raw = args.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut pairs = Vec::new();

    for part in raw.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let (initial, fullname) = part.split_once('=').ok_or(ParseError::SetMapUsage)?;
        let initial = initial.trim();
        let fullname = fullname.trim();
        if initial.chars().count() != 1 || fullname.is_empty() {
            return Err(ParseError::SetMapPair);
        }
        pairs.push(AliasPair {
            initial: initial.to_lowercase(),
            fullname: fullname.to_string(),
        });
    }

    if pairs.is_empty() {
        return Err(ParseError::SetMapUsage);
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(text: &str) -> ExpenseEntry {
        parse_entry(text).unwrap_or_else(|| panic!("{text:?} should parse"))
    }

    #[test]
    fn test_parse_plain_entry() {
        let e = entry("b 120 siêu thị");
        assert_eq!(e.initial, "b");
        assert_eq!(e.amount, 120);
        assert_eq!(e.note, "siêu thị");
        assert_eq!(e.participants, ParticipantSpec::Everyone);
    }

    #[test]
    fn test_parse_k_suffix_and_separators() {
        assert_eq!(entry("D 134k tiền điện").amount, 134);
        assert_eq!(entry("D 134k tiền điện").note, "tiền điện");
        assert_eq!(entry("a 1.200 thuê xe").amount, 1200);
        assert_eq!(entry("a 1,250k").amount, 1250);
        assert_eq!(entry("a 50K").note, "");
    }

    #[test]
    fn test_parse_word_starting_with_k_stays_in_note() {
        let e = entry("b 120 kem");
        assert_eq!(e.amount, 120);
        assert_eq!(e.note, "kem");
    }

    #[test]
    fn test_parse_note_glued_to_amount() {
        let e = entry("b 120ăn trưa");
        assert_eq!(e.amount, 120);
        assert_eq!(e.note, "ăn trưa");

        let e = entry("b 120kem");
        assert_eq!(e.amount, 120);
        assert_eq!(e.note, "kem");

        assert_eq!(entry("b 120abc").note, "abc");
        assert_eq!(entry("b 120k kem").note, "kem");
    }

    #[test]
    fn test_parse_rejects_oversized_amounts() {
        assert_eq!(entry("a 1000000000000").amount, MAX_AMOUNT);
        assert_eq!(entry("a -1000000000000").amount, -MAX_AMOUNT);
        assert!(parse_entry("a 1000000000001").is_none());
        assert!(parse_entry("a 9223372036854775807").is_none());
        assert!(parse_entry("a 99999999999999999999").is_none());
    }

    #[test]
    fn test_parse_negative_correction() {
        assert_eq!(entry("a -30 trả lại").amount, -30);
    }

    #[test]
    fn test_parse_rejects_non_entries() {
        assert!(parse_entry("hello world").is_none());
        assert!(parse_entry("bb 120").is_none());
        assert!(parse_entry("b abc").is_none());
        assert!(parse_entry("").is_none());
    }

    #[test]
    fn test_parse_participant_suffix() {
        let e = entry("a 200 pizza @ab");
        assert_eq!(e.note, "pizza");
        assert_eq!(
            e.participants,
            ParticipantSpec::Initials(vec!["a".to_string(), "b".to_string()])
        );

        let e = entry("a 200 @BaB");
        assert_eq!(e.note, "");
        assert_eq!(
            e.participants,
            ParticipantSpec::Initials(vec!["b".to_string(), "a".to_string()])
        );

        assert_eq!(entry("a 200 ăn @all").participants, ParticipantSpec::Everyone);
        assert_eq!(entry("a 200 ăn @all").note, "ăn");
    }

    #[test]
    fn test_parse_non_initial_mention_stays_in_note() {
        let e = entry("a 200 quà cho @an_2");
        assert_eq!(e.note, "quà cho @an_2");
        assert_eq!(e.participants, ParticipantSpec::Everyone);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_message("/tongket"), Ok(Some(Command::Summary)));
        assert_eq!(parse_message("/tongket@chi_tieu_bot"), Ok(Some(Command::Summary)));
        assert_eq!(parse_message("/batdau"), Ok(Some(Command::NewPeriod)));
        assert_eq!(parse_message("/start"), Ok(Some(Command::Start)));
        assert_eq!(parse_message("/unknown"), Ok(None));
        assert_eq!(parse_message("chào cả nhà"), Ok(None));
    }

    #[test]
    fn test_parse_setmap() {
        let pairs = parse_setmap("b=Bình; a = An ;d=Duy").unwrap();
        assert_eq!(
            pairs,
            vec![
                AliasPair { initial: "b".into(), fullname: "Bình".into() },
                AliasPair { initial: "a".into(), fullname: "An".into() },
                AliasPair { initial: "d".into(), fullname: "Duy".into() },
            ]
        );

        let pairs = parse_setmap("K=Khoa   Nguyễn").unwrap();
        assert_eq!(pairs[0].initial, "k");
        assert_eq!(pairs[0].fullname, "Khoa Nguyễn");
    }

    #[test]
    fn test_parse_setmap_errors() {
        assert_eq!(parse_setmap(""), Err(ParseError::SetMapUsage));
        assert_eq!(parse_setmap("b Bình"), Err(ParseError::SetMapUsage));
        assert_eq!(parse_setmap("bi=Bình"), Err(ParseError::SetMapPair));
        assert_eq!(parse_setmap("b="), Err(ParseError::SetMapPair));
        assert_eq!(
            parse_message("/setmap"),
            Err(ParseError::SetMapUsage)
        );
        assert_eq!(ParseError::SetMapUsage.to_string(), SETMAP_USAGE);
    }
}
