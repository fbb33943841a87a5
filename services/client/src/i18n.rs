//! services/client/src/i18n.rs
//!
//! Maps server-supplied error messages to display text.
//! Unknown messages pass through verbatim.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    En,
    Vi,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Vi => "vi",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "vi" | "vietnamese" => Ok(Language::Vi),
            other => Err(format!("unsupported language '{other}'")),
        }
    }
}

// (server message, English, Vietnamese). Keys are compared case-insensitively.
const CATALOG: &[(&str, &str, &str)] = &[
    (
        "invalid credentials",
        "Incorrect email or password.",
        "Email hoặc mật khẩu không đúng.",
    ),
    (
        "invalid email or password",
        "Incorrect email or password.",
        "Email hoặc mật khẩu không đúng.",
    ),
    (
        "user not found",
        "No account exists for this email.",
        "Không tìm thấy tài khoản với email này.",
    ),
    (
        "account is locked",
        "This account has been locked. Contact your administrator.",
        "Tài khoản đã bị khóa. Vui lòng liên hệ quản trị viên.",
    ),
    (
        "invalid or expired otp",
        "The verification code is invalid or has expired.",
        "Mã xác thực không hợp lệ hoặc đã hết hạn.",
    ),
    (
        "old password is incorrect",
        "Your current password is incorrect.",
        "Mật khẩu hiện tại không đúng.",
    ),
    (
        "email already exists",
        "This email is already in use.",
        "Email này đã được sử dụng.",
    ),
    (
        "message not found",
        "This message no longer exists.",
        "Tin nhắn không còn tồn tại.",
    ),
    (
        "class not found",
        "This class no longer exists.",
        "Lớp học không còn tồn tại.",
    ),
    (
        "responses are locked",
        "Responses to this message are closed.",
        "Tin nhắn này đã khóa phản hồi.",
    ),
    (
        "unauthorized",
        "Your session has expired. Please sign in again.",
        "Phiên đăng nhập đã hết hạn. Vui lòng đăng nhập lại.",
    ),
];

/// Returns the display text for a server message in `language`.
pub fn translate(message: &str, language: Language) -> String {
    let key = message.trim().trim_end_matches('.').to_lowercase();
    CATALOG
        .iter()
        .find(|(server, _, _)| *server == key)
        .map(|(_, en, vi)| match language {
            Language::En => (*en).to_string(),
            Language::Vi => (*vi).to_string(),
        })
        .unwrap_or_else(|| message.to_string())
}

/// Fallback text for failures that carry no server message.
pub fn network_failure(language: Language) -> &'static str {
    match language {
        Language::En => "Could not reach the server. Check your connection and try again.",
        Language::Vi => "Không thể kết nối máy chủ. Vui lòng kiểm tra kết nối và thử lại.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_messages_are_translated_case_insensitively() {
        assert_eq!(
            translate("Invalid credentials.", Language::En),
            "Incorrect email or password."
        );
        assert_eq!(
            translate("USER NOT FOUND", Language::Vi),
            "Không tìm thấy tài khoản với email này."
        );
    }

    #[test]
    fn unknown_messages_pass_through_verbatim() {
        assert_eq!(
            translate("Quota exceeded for uploads", Language::Vi),
            "Quota exceeded for uploads"
        );
    }

    #[test]
    fn language_codes_round_trip_through_display() {
        for lang in [Language::En, Language::Vi] {
            assert_eq!(lang.to_string().parse::<Language>().unwrap(), lang);
        }
        assert!("fr".parse::<Language>().is_err());
    }
}
