//! UI-facing consumers of the notification stream: the unread badge and
//! toast popups.

mod toast;
mod unread;

pub use toast::{Toast, ToastQueue};
pub use unread::{badge_label, UnreadCounter};
