//! Reply texts sent back to the chat.

use chrono::{DateTime, TimeZone, Utc};
use std::fmt::Display;

use crate::commands::AliasPair;
use crate::models::{BalanceSheet, Participants, Transfer};

pub const HELP_TEXT: &str = "Bot quản lý chi tiêu theo định dạng:\n\
• Ghi chi:  b 120 siêu thị  |  a 317 ăn  |  d 134 tiền điện\n  \
(chữ cái đầu là viết tắt tên, số là 'k'; '120k' cũng hiểu là 120)\n\
• Chia riêng: a 200 pizza @ab  (chỉ chia cho a và b)\n\
• /tongket  : tổng kết kỳ hiện tại\n\
• /batdau   : xóa dữ liệu cũ, bắt đầu kỳ mới (mốc thời gian mới)\n\
• /setmap b=Bình;a=An;d=Duy : đặt/đổi map chữ cái → tên đầy đủ";

pub const BALANCED_TEXT: &str = "✅ Đã cân bằng chi tiêu giữa các thành viên.";

/// `120` → `120k`.
pub fn fmt_k(amount: i64) -> String {
    format!("{amount}k")
}

/// Formats a timestamp as `dd-mm-YYYY` in the given zone.
pub fn fmt_date_dmy<Tz>(at: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.with_timezone(tz).format("%d-%m-%Y").to_string()
}

pub fn recorded_reply(payer: &str, amount: i64, note: &str, participants: &Participants) -> String {
    let quoted_note = if note.is_empty() { "(không ghi chú)" } else { note };
    let mut reply = format!("đã ghi nhận: \"{payer} chi {} cho {quoted_note}\"", fmt_k(amount));
    if let Participants::Subset(names) = participants {
        if !names.is_empty() {
            reply.push_str(&format!(" (chia cho {})", names.join(", ")));
        }
    }
    reply
}

pub fn unknown_initial_reply(initial: &str) -> String {
    format!("Chưa biết ký tự '{initial}'. Hãy đặt map bằng /setmap {initial}=Tên đầy đủ")
}

pub fn aliases_updated_reply(pairs: &[AliasPair]) -> String {
    let shown = pairs
        .iter()
        .map(|p| format!("{}→{}", p.initial, p.fullname))
        .collect::<Vec<_>>()
        .join(", ");
    format!("✅ Đã cập nhật map: {shown}")
}

pub fn new_period_reply(start: &str) -> String {
    format!("✅ Đã bắt đầu kỳ mới từ ngày {start}. Dữ liệu kỳ trước đã xoá.")
}

fn summary_header(start: &str, end: &str) -> String {
    format!("Chi tiêu từ ngày {start} đến {end}:")
}

pub fn empty_summary(start: &str, end: &str) -> String {
    format!("{}\n- (chưa có khoản chi nào)\n", summary_header(start, end))
}

/// Paid totals per member, then the transfers on one line.
pub fn summary(start: &str, end: &str, sheet: &BalanceSheet, transfers: &[Transfer]) -> String {
    let mut lines = vec![summary_header(start, end)];
    for name in &sheet.members {
        lines.push(format!(
            "- {name} đã chi tiêu tổng cộng: {}",
            fmt_k(sheet.paid_by(name))
        ));
    }

    if transfers.is_empty() {
        lines.push(BALANCED_TEXT.to_string());
    } else {
        lines.push(
            transfers
                .iter()
                .map(|t| format!("{} trả {} {}", t.from, t.to, fmt_k(t.amount)))
                .collect::<Vec<_>>()
                .join(", "),
        );
    }

    lines.join("\n")
}
