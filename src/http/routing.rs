use std::borrow::Cow;

use crate::model::id::*;

/// Used to group requests together for ratelimiting.
///
/// Requests to routes of the same kind with the same major parameter share a bucket; Discord tells
/// which bucket that is through the `x-ratelimit-bucket` header.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RatelimitingBucket(Option<(RouteKind, Option<GenericId>)>);

impl RatelimitingBucket {
    /// Whether requests on this route bypass ratelimiting entirely.
    #[must_use]
    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    /// The major parameter of the route, if it has one.
    #[must_use]
    pub fn major_parameter(&self) -> Option<GenericId> {
        self.0.and_then(|(_, id)| id)
    }
}

enum RatelimitingKind {
    /// Requests with the same path and major parameter (usually an Id) should be grouped together
    /// for ratelimiting.
    PathAndId(GenericId),
    /// Requests with the same path should be ratelimited together.
    Path,
}

/// A macro for defining routes as well as the type of ratelimiting they perform. Takes as input a
/// list of route definitions, and generates a definition for the `Route` enum and implements
/// methods on it.
macro_rules! routes {
    ($lt:lifetime, {
        $(
            $name:ident $({ $($field_name:ident: $field_type:ty),* })?,
            $path:expr,
            $ratelimiting_kind:expr;
        )+
    }) => {
        #[derive(Clone, Copy, Debug)]
        pub enum Route<$lt> {
            $(
                $name $({ $($field_name: $field_type),* })?,
            )+
        }

        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        enum RouteKind {
            $($name,)+
        }

        impl<$lt> Route<$lt> {
            fn kind(&self) -> RouteKind {
                match self {
                    $(
                        Self::$name {..} => RouteKind::$name,
                    )+
                }
            }

            #[must_use]
            pub fn path(self) -> Cow<'static, str> {
                match self {
                    $(
                        Self::$name $({ $($field_name),* })? => $path.into(),
                    )+
                }
            }

            #[must_use]
            pub fn ratelimiting_bucket(&self) -> RatelimitingBucket {
                #[allow(unused_variables)]
                let ratelimiting_kind = match *self {
                    $(
                        Self::$name $({ $($field_name),* })? => $ratelimiting_kind,
                    )+
                };

                RatelimitingBucket(ratelimiting_kind.map(|r| {
                    let id = match r {
                        RatelimitingKind::PathAndId(id) => Some(id),
                        RatelimitingKind::Path => None,
                    };
                    (self.kind(), id)
                }))
            }
        }
    };
}

// This macro takes as input a list of route definitions, represented in the following way:
// 1. The first line defines an enum variant representing an endpoint.
// 2. The second line provides the url for that endpoint.
// 3. The third line indicates what type of ratelimiting the endpoint employs.
routes! ('a, {
    ChannelMessage { channel_id: ChannelId, message_id: MessageId },
    api!("/channels/{}/messages/{}", channel_id, message_id),
    Some(RatelimitingKind::PathAndId(GenericId::new(channel_id.get())));

    ChannelMessageCrosspost { channel_id: ChannelId, message_id: MessageId },
    api!("/channels/{}/messages/{}/crosspost", channel_id, message_id),
    Some(RatelimitingKind::PathAndId(GenericId::new(channel_id.get())));

    ChannelMessages { channel_id: ChannelId },
    api!("/channels/{}/messages", channel_id),
    Some(RatelimitingKind::PathAndId(GenericId::new(channel_id.get())));

    Commands { application_id: ApplicationId },
    api!("/applications/{}/commands", application_id),
    Some(RatelimitingKind::PathAndId(GenericId::new(application_id.get())));

    GuildCommands { application_id: ApplicationId, guild_id: GuildId },
    api!("/applications/{}/guilds/{}/commands", application_id, guild_id),
    Some(RatelimitingKind::PathAndId(GenericId::new(guild_id.get())));

    Gateway,
    api!("/gateway"),
    None;

    GuildMember { guild_id: GuildId, user_id: UserId },
    api!("/guilds/{}/members/{}", guild_id, user_id),
    Some(RatelimitingKind::PathAndId(GenericId::new(guild_id.get())));

    InteractionResponse { interaction_id: InteractionId, token: &'a str },
    api!("/interactions/{}/{}/callback", interaction_id, token),
    Some(RatelimitingKind::PathAndId(GenericId::new(interaction_id.get())));

    User { user_id: UserId },
    api!("/users/{}", user_id),
    Some(RatelimitingKind::Path);

    UserMe,
    api!("/users/@me"),
    Some(RatelimitingKind::Path);

    UserMeDmChannels,
    api!("/users/@me/channels"),
    Some(RatelimitingKind::Path);

    WebhookFollowupMessage { application_id: ApplicationId, token: &'a str, message_id: MessageId },
    api!("/webhooks/{}/{}/messages/{}", application_id, token, message_id),
    Some(RatelimitingKind::PathAndId(GenericId::new(application_id.get())));

    WebhookFollowupMessages { application_id: ApplicationId, token: &'a str },
    api!("/webhooks/{}/{}", application_id, token),
    Some(RatelimitingKind::PathAndId(GenericId::new(application_id.get())));

    WebhookOriginalInteractionResponse { application_id: ApplicationId, token: &'a str },
    api!("/webhooks/{}/{}/messages/@original", application_id, token),
    Some(RatelimitingKind::PathAndId(GenericId::new(application_id.get())));
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_and_buckets() {
        let route = Route::WebhookOriginalInteractionResponse {
            application_id: ApplicationId::new(1),
            token: "abc",
        };
        assert_eq!(route.path(), "https://discord.com/api/v10/webhooks/1/abc/messages/@original");
        assert_eq!(route.ratelimiting_bucket().major_parameter(), Some(GenericId::new(1)));

        let followups = Route::WebhookFollowupMessages {
            application_id: ApplicationId::new(1),
            token: "other-token",
        };
        assert_ne!(route.ratelimiting_bucket(), followups.ratelimiting_bucket());

        assert!(Route::Gateway.ratelimiting_bucket().is_none());

        let channel_id = ChannelId::new(3);
        let message = Route::ChannelMessage {
            channel_id,
            message_id: MessageId::new(4),
        };
        assert_eq!(message.path(), "https://discord.com/api/v10/channels/3/messages/4");
        assert_eq!(message.ratelimiting_bucket().major_parameter(), Some(GenericId::new(3)));
        let other_channel = Route::ChannelMessages {
            channel_id: ChannelId::new(5),
        };
        assert_ne!(
            Route::ChannelMessages {
                channel_id,
            }
            .ratelimiting_bucket(),
            other_channel.ratelimiting_bucket()
        );

        let member = Route::GuildMember {
            guild_id: GuildId::new(6),
            user_id: UserId::new(7),
        };
        assert_eq!(member.path(), "https://discord.com/api/v10/guilds/6/members/7");
        assert_eq!(member.ratelimiting_bucket().major_parameter(), Some(GenericId::new(6)));
        assert!(!Route::UserMe.ratelimiting_bucket().is_none());
        assert_eq!(Route::UserMe.ratelimiting_bucket().major_parameter(), None);
    }
}
