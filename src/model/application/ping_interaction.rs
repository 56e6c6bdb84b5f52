use crate::model::id::{ApplicationId, InteractionId};

/// A ping interaction, which can only be received through an endpoint url.
///
/// It is answered with a pong by the listener itself and never reaches handlers. Only its type
/// is required, the ids are kept when Discord sends them.
///
/// [Discord docs](https://discord.com/developers/docs/interactions/receiving-and-responding#receiving-an-interaction).
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct PingInteraction {
    /// Id of the interaction.
    pub id: Option<InteractionId>,
    /// Id of the application this interaction is for.
    pub application_id: Option<ApplicationId>,
}
