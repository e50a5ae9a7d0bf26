//! Keyword/regex fallback for schedule understanding.
//!
//! Used when the LLM is unconfigured or unavailable. A set of independent
//! pattern rules over the message text: schedule/greeting keyword detection
//! plus time, date, location, and title extraction. Patterns cover both
//! CJK and English phrasings since client messages arrive in either.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static AMPM_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})(?::(\d{2}))?\s*(am|pm)\b").unwrap());
static CJK_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(上午|下午|晚上)?\s*(\d{1,2})[点时](?:(\d{1,2})分?)?").unwrap());
static COLON_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2}):(\d{2})\b").unwrap());
static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}[-/]\d{1,2}[-/]\d{1,2}").unwrap());
static DIRECT_ROOM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(room|classroom|教室|会议室|办公室)\s*(\d{3,4})").unwrap());
static AT_ROOM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bat\s+([A-Za-z]?\d{3,4})\b").unwrap());
static PUNCT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[，,。.\s]+").unwrap());
static TIME_STRIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d{1,2}\s*(am|pm|点|时|:)\s*\d*").unwrap());
static ROOM_STRIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(room|classroom|教室|会议室|办公室)\s*\d+").unwrap());

const SCHEDULE_KEYWORDS: &[&str] = &[
    "会议", "开会", "面试", "约会", "提醒", "日程", "安排", "明天", "后天", "下周", "上午",
    "下午", "晚上", "点", "时", "meeting", "interview", "appointment", "reminder", "schedule",
    "tomorrow", "next week",
];

const GREETINGS: &[&str] = &["你好", "您好", "hello", "hi", "在吗", "help", "帮助"];

const EVENT_KEYWORDS: &[&str] = &[
    "开会", "会议", "meeting", "面试", "interview", "谈话", "talk", "约会", "appointment",
    "课程", "class", "考试", "exam", "one on one",
];

const CONFIRMATION_WORDS: &[&str] = &[
    "安排", "记录", "提醒", "设置", "确认", "added", "recorded", "scheduled", "reminder",
    "confirmed", "noted",
];

/// Schedule details pulled out of a chat exchange.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScheduleInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub valid: bool,
}

/// Produce a canned reply for a user message without any model call.
pub fn analyze(message: &str) -> String {
    let lower = message.to_lowercase();

    if contains_schedule_keywords(&lower) || AMPM_TIME.is_match(message) {
        return match extract_time(message) {
            Some(time) => format!(
                "Noted your schedule: {message}. Time: {time}. I'll remind you when it comes up."
            ),
            None => format!("Noted your schedule: {message}. I'll remind you when it comes up."),
        };
    }

    if contains_greeting(&lower) {
        return "Hi! I'm your schedule assistant. Tell me what to plan — for example: \
                'meeting tomorrow at 3pm' or 'interview next Monday at 10am'."
            .to_string();
    }

    format!("Got your message: {message}. I'll take care of the schedule-related parts.")
}

pub fn contains_schedule_keywords(lower: &str) -> bool {
    SCHEDULE_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

pub fn contains_greeting(lower: &str) -> bool {
    GREETINGS.iter().any(|g| lower.contains(g))
}

/// Extract a normalized HH:MM time from free text.
pub fn extract_time(text: &str) -> Option<String> {
    // "3pm", "8:30 am"
    if let Some(caps) = AMPM_TIME.captures(text) {
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps.get(2).map_or(0, |m| m.as_str().parse().unwrap_or(0));
        let period = caps[3].to_lowercase();
        let hour = to_24h(hour, &period)?;
        return Some(format!("{hour:02}:{minute:02}"));
    }

    // "下午3点", "8点30", "9时"
    if let Some(caps) = CJK_TIME.captures(text) {
        let hour: u32 = caps[2].parse().ok()?;
        let minute: u32 = caps.get(3).map_or(0, |m| m.as_str().parse().unwrap_or(0));
        let period = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let hour = to_24h(hour, period)?;
        return Some(format!("{hour:02}:{minute:02}"));
    }

    // Bare "14:30"
    if let Some(caps) = COLON_TIME.captures(text) {
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps[2].parse().ok()?;
        if hour < 24 && minute < 60 {
            return Some(format!("{hour:02}:{minute:02}"));
        }
    }

    None
}

fn to_24h(hour: u32, period: &str) -> Option<u32> {
    if hour > 23 {
        return None;
    }
    let is_pm = period == "pm" || period == "下午" || period == "晚上";
    let is_am = period == "am" || period == "上午";
    Some(if is_pm && hour < 12 {
        hour + 12
    } else if is_am && hour == 12 {
        0
    } else {
        hour
    })
}

/// Extract a date mention: relative day words or an explicit `YYYY-MM-DD`.
pub fn extract_date(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    for word in [
        "明天",
        "后天",
        "今天",
        "下周",
        "tomorrow",
        "today",
        "next week",
    ] {
        if lower.contains(word) {
            return Some(word.to_string());
        }
    }
    ISO_DATE.find(text).map(|m| m.as_str().to_string())
}

/// Extract a location mention, usually a room number near a location word.
pub fn extract_location(text: &str) -> Option<String> {
    if let Some(caps) = DIRECT_ROOM.captures(text) {
        return Some(format!("{} {}", &caps[1], &caps[2]));
    }
    if let Some(caps) = AT_ROOM.captures(text) {
        return Some(caps[1].to_string());
    }
    None
}

/// Extract an event title from the user message: a window of text around an
/// event keyword, cleaned up and clamped; falls back to a generic label.
pub fn extract_title(user_message: &str) -> String {
    let lower = user_message.to_lowercase();
    let lower_chars: Vec<char> = lower.chars().collect();
    let chars: Vec<char> = user_message.chars().collect();

    for keyword in EVENT_KEYWORDS {
        let needle: Vec<char> = keyword.chars().collect();
        if let Some(idx) = find_chars(&lower_chars, &needle) {
            // Lowercasing can shift char counts for rare scripts; clamp the
            // window to the original text.
            let start = idx.saturating_sub(15).min(chars.len());
            let end = (idx + needle.len() + 15).min(chars.len()).max(start);
            let window: String = chars[start..end].iter().collect();
            let title = clean_title(&window);
            let len = title.chars().count();
            if (3..=50).contains(&len) {
                return title;
            }
        }
    }

    // No event keyword: strip time/location noise and use what's left.
    let stripped = TIME_STRIP.replace_all(user_message, " ");
    let stripped = ROOM_STRIP.replace_all(&stripped, " ");
    let title = clean_title(&stripped);
    let len = title.chars().count();
    if len >= 3 {
        return title.chars().take(50).collect::<String>().trim().to_string();
    }

    "schedule".to_string()
}

fn clean_title(text: &str) -> String {
    PUNCT_RUN.replace_all(text, " ").trim().to_string()
}

fn find_chars(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (0..=haystack.len() - needle.len()).find(|&i| haystack[i..i + needle.len()] == *needle)
}

/// Extract schedule info from a user message + assistant reply pair.
///
/// Only runs when the assistant reply reads as a confirmation; returns
/// `None` otherwise so callers don't attach schedule blocks to small talk.
pub fn extract_schedule_info(user_message: &str, assistant_reply: &str) -> Option<ScheduleInfo> {
    let reply_lower = assistant_reply.to_lowercase();
    let confirmed = CONFIRMATION_WORDS.iter().any(|w| reply_lower.contains(w));
    if !confirmed {
        return None;
    }

    let combined = format!("{user_message} {assistant_reply}");
    let mut info = ScheduleInfo {
        time: extract_time(&combined),
        date: extract_date(&combined),
        location: extract_location(&combined),
        title: Some(extract_title(user_message)),
        valid: false,
    };
    info.valid = info.time.is_some() || info.date.is_some() || info.title.is_some();
    Some(info)
}
