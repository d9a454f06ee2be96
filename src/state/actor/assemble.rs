//! Correlation of raw stored rows into wire event details.

use crate::store::StoredEvents;
use sputnik_proto::{
    AttachmentDetail, EventBundle, MessageEventDetail, ReactionDetail, SystemEventDetail,
};

/// Attach every attachment and reaction to the message whose id it references.
///
/// Rows referencing a message that is not part of `events` are dropped. A
/// message that was never edited reports an update timestamp of `0`.
pub fn assemble_bundle(room_id: &str, events: StoredEvents) -> EventBundle {
    let StoredEvents {
        message_events,
        attachment_events,
        reaction_events,
        system_events,
    } = events;

    let message_events = message_events
        .into_iter()
        .map(|message| {
            let attachments = attachment_events
                .iter()
                .filter(|a| a.message_event_id == message.id)
                .map(|a| AttachmentDetail {
                    event_id: message.id.clone(),
                    attachment_id: a.id.clone(),
                    mime_type: a.mime_type.clone(),
                    create_timestamp: a.create_time.timestamp_millis(),
                })
                .collect();

            let reactions = reaction_events
                .iter()
                .filter(|r| r.message_event_id == message.id)
                .map(|r| ReactionDetail {
                    event_id: message.id.clone(),
                    reaction_id: r.id.clone(),
                    user_id: r.user_id.clone(),
                    content: r.content.clone(),
                    create_timestamp: r.create_time.timestamp_millis(),
                })
                .collect();

            MessageEventDetail {
                event_id: message.id,
                room_id: message.room_id,
                sender_id: message.user_id,
                client_event_id: message.client_event_id,
                version: message.version,
                content: message.content,
                attachments,
                reactions,
                create_timestamp: message.create_time.timestamp_millis(),
                update_timestamp: message.update_time.map_or(0, |t| t.timestamp_millis()),
            }
        })
        .collect();

    let system_events = system_events
        .into_iter()
        .map(|event| SystemEventDetail {
            event_id: event.id,
            room_id: room_id.to_string(),
            version: event.version,
            content: event.content,
            create_timestamp: event.create_time.timestamp_millis(),
        })
        .collect();

    EventBundle {
        message_events,
        system_events,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{AttachmentEvent, MessageEvent, ReactionEvent, SystemEvent, from_millis};

    fn message(id: &str, updated: Option<i64>) -> MessageEvent {
        MessageEvent {
            id: id.into(),
            room_id: "r1".into(),
            user_id: "alice".into(),
            client_event_id: 3,
            version: 2,
            content: "text".into(),
            create_time: from_millis(100),
            update_time: updated.map(from_millis),
        }
    }

    fn attachment(id: &str, parent: &str) -> AttachmentEvent {
        AttachmentEvent {
            id: id.into(),
            room_id: "r1".into(),
            message_event_id: parent.into(),
            mime_type: "image/jpeg".into(),
            create_time: from_millis(101),
        }
    }

    fn reaction(id: &str, parent: &str) -> ReactionEvent {
        ReactionEvent {
            id: id.into(),
            room_id: "r1".into(),
            message_event_id: parent.into(),
            user_id: "bob".into(),
            content: ":tada:".into(),
            create_time: from_millis(102),
        }
    }

    #[test]
    fn children_attach_to_their_own_parent_only() {
        let events = StoredEvents {
            message_events: vec![message("m1", None), message("m2", Some(150))],
            attachment_events: vec![attachment("a1", "m1"), attachment("a2", "m2"), attachment("a3", "gone")],
            reaction_events: vec![reaction("x1", "m2"), reaction("x2", "m2")],
            system_events: vec![],
        };

        let bundle = assemble_bundle("r1", events);
        let m1 = &bundle.message_events[0];
        let m2 = &bundle.message_events[1];

        assert_eq!(m1.attachments.len(), 1);
        assert_eq!(m1.attachments[0].attachment_id, "a1");
        assert!(m1.reactions.is_empty());
        assert_eq!(m2.attachments[0].attachment_id, "a2");
        assert_eq!(m2.reactions.len(), 2);
        assert!(m2.reactions.iter().all(|r| r.event_id == "m2"));
    }

    #[test]
    fn missing_update_time_is_zero() {
        let events = StoredEvents {
            message_events: vec![message("m1", None), message("m2", Some(150))],
            ..StoredEvents::default()
        };
        let bundle = assemble_bundle("r1", events);
        assert_eq!(bundle.message_events[0].update_timestamp, 0);
        assert_eq!(bundle.message_events[1].update_timestamp, 150);
    }

    #[test]
    fn system_events_take_the_room_id() {
        let events = StoredEvents {
            system_events: vec![SystemEvent {
                id: "s1".into(),
                room_id: "stale".into(),
                version: 1,
                content: "created".into(),
                create_time: from_millis(5),
            }],
            ..StoredEvents::default()
        };
        let bundle = assemble_bundle("r1", events);
        assert_eq!(bundle.system_events[0].room_id, "r1");
        assert_eq!(bundle.system_events[0].create_timestamp, 5);
    }
}
