use marathon_types::{Notification, NotificationRecord};

/// Whether `record` should be shown as unread.
///
/// `isRead` wins over `read` whenever it is present, even if the two disagree.
/// Only an explicit `false` counts as unread; a flag sent as `null` is present
/// and reads as read. A record with neither flag is unread.
pub fn is_unread(record: &NotificationRecord) -> bool {
    match (record.is_read, record.read) {
        (Some(is_read), _) => is_read == Some(false),
        (None, Some(read)) => read == Some(false),
        (None, None) => true,
    }
}

/// Collapse the two source flags into [`Notification::unread`].
pub fn classify(record: NotificationRecord) -> Notification {
    let unread = is_unread(&record);
    let sent_at = record.sent_at.unwrap_or_else(|| record.created_at.clone());
    Notification {
        id: record.id,
        title: record.title,
        body: record.body,
        created_at: record.created_at,
        sent_at,
        unread,
        kind: record.kind,
        event_id: record.event_id,
    }
}
