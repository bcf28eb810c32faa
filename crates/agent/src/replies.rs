//! Fixed user-facing strings and phrase lists
//!
//! These are product copy, not logic: swap freely. Tests compare against the
//! constants, never against literal text.

use rand::seq::SliceRandom;

/// Welcome message for an empty first contact. Sent without any model call.
pub const WELCOME: &str = "👋 <b>به چت‌بات مشاور املاک ترونست خوش آمدید!</b><br>\
من اینجا هستم تا به شما در پیدا کردن بهترین املاک در دبی کمک کنم. 🏡<br>\
چطور می‌توانم کمکتان کنم؟";

/// Messages treated as a plain greeting, answered locally.
pub const GREETINGS: &[&str] = &[
    "سلام",
    "سلام خوبی؟",
    "سلام چطوری؟",
    "سلام وقت بخیر",
    "سلام روزت بخیر",
    "hi",
    "hello",
    "hey",
];

const GREETING_REPLIES: &[&str] = &[
    "سلام! من اینجا هستم که به شما در خرید ملک کمک کنم 😊 اگر سوالی درباره املاک دارید، بفرمایید.",
    "سلام دوست عزیز! به چت‌بات مشاور املاک خوش آمدید. چطور می‌توانم کمکتان کنم؟ 🏡",
    "سلام! اگر به دنبال خرید یا سرمایه‌گذاری در املاک دبی هستید، من راهنمای شما هستم!",
];

/// Generic clarification when classification cannot be parsed or the intent
/// is unknown.
pub const CLARIFY: &str = "متوجه نشدم که به دنبال چه چیزی هستید. لطفاً واضح‌تر بگویید که \
دنبال ملک هستید یا اطلاعات بیشتری درباره ملکی می‌خواهید.";

/// Clarification when filter extraction fails; asks the user to restate.
pub const CLARIFY_RESTATE: &str = "نتوانستم جزئیات جستجو را از پیام شما استخراج کنم. لطفاً \
دوباره و با جزئیات بیشتر بفرمایید.";

/// Bilingual continue-vs-reset prompt for the confirmation gate.
pub const CONFIRM_CONTINUE_OR_RESET: &str = "شما یک جستجوی فعال با فیلترهای قبلی دارید. \
می‌خواهید با همان فیلترها <b>ادامه</b> دهید یا <b>از اول</b> شروع کنیم؟<br>\
You have an active search with saved filters. Reply \"continue\" to keep them or \"reset\" \
to start over.";

/// Acknowledgement after an explicit reset.
pub const RESET_ACK: &str = "باشه، همه فیلترهای قبلی پاک شد. جستجوی جدید را شروع کنید. ✅";

/// No listing matched the filters.
pub const NOTHING_FOUND: &str = "متأسفانه هیچ ملکی با این مشخصات پیدا نشد. لطفاً بازه قیمتی \
را تغییر دهید یا منطقه دیگری انتخاب کنید.";

/// Availability check came back empty.
pub const NOT_AVAILABLE: &str = "در حال حاضر ملکی با این مشخصات موجود نیست. می‌توانید \
مشخصات را تغییر دهید تا دوباره بررسی کنم.";

/// "Show more" ran past the end of the stored results.
pub const ALL_SHOWN: &str = "✅ تمامی املاک نمایش داده شده‌اند و مورد جدیدی موجود نیست.";

/// A detail/compare/purchase reference could not be resolved.
pub const WHICH_LISTING: &str = "لطفاً شماره یا نام ملک را مشخص کنید. مثال: «ملک ۲» یا نام پروژه.";

/// Compare needs exactly two resolvable listings.
pub const NEED_TWO_LISTINGS: &str = "برای مقایسه، لطفاً دو ملک را با شماره یا نام مشخص کنید. \
مثال: «ملک ۱ و ملک ۲ را مقایسه کن».";

/// Remote lookup failed mid-flow.
pub const COULD_NOT_FIND: &str = "متأسفانه اطلاعات این ملک در دسترس نیست. لطفاً ملک دیگری \
را انتخاب کنید.";

/// Transient failure; the turn is lost but the session is intact.
pub const TRY_AGAIN: &str = "مشکلی پیش آمد، لطفاً دوباره تلاش کنید.";

/// Call-to-action appended to every listing page.
pub const FOOTER: &str = "<br><br>برای جزئیات بیشتر، شماره ملک را بفرستید (مثلاً «ملک ۲»). \
برای دیدن موارد بیشتر بنویسید «املاک دیگه رو نشونم بده». برای مشاوره با کارشناسان ترونست: \
<a href=\"https://www.trunest.ae\">trunest.ae</a>";

const CONTINUE_PHRASES: &[&str] = &["ادامه", "همین", "continue", "proceed"];
const RESET_PHRASES: &[&str] = &["از اول", "ریست", "پاک کن", "reset", "start over"];

pub fn is_greeting(message: &str) -> bool {
    let trimmed = message.trim();
    GREETINGS
        .iter()
        .any(|g| trimmed.eq_ignore_ascii_case(g) || trimmed == *g)
}

pub fn random_greeting() -> &'static str {
    GREETING_REPLIES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(GREETING_REPLIES[0])
}

/// Reset wins when a reply somehow contains both phrasings; destroying state
/// is what the user spelled out explicitly.
pub fn is_reset_phrase(message: &str) -> bool {
    let lower = message.to_lowercase();
    RESET_PHRASES.iter().any(|p| lower.contains(p))
}

pub fn is_continue_phrase(message: &str) -> bool {
    let lower = message.to_lowercase();
    CONTINUE_PHRASES.iter().any(|p| lower.contains(p))
}
