mod unread_poller;

pub use unread_poller::UnreadCountPoller;
