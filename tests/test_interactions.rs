mod common;

use std::sync::Arc;

use axum::http::Method;
use common::{MockApi, Reply};
use serde_json::{json, Value};
use tempest::builder::{AutocompleteChoice, CreateMessage};
use tempest::model::application::{
    AutocompleteInteraction,
    CommandInteraction,
    ComponentInteraction,
    Interaction,
    InteractionError,
    ReplyAction,
};
use tempest::model::id::MessageId;
use tempest::Error;

fn decode(api: &MockApi, payload: &Value) -> Interaction {
    let http = Arc::new(api.http());
    Interaction::decode(&serde_json::to_vec(payload).unwrap(), &http).unwrap().unwrap()
}

fn command(api: &MockApi) -> CommandInteraction {
    decode(api, &common::command_payload("ping", json!([]))).command().unwrap()
}

#[tokio::test]
async fn concurrent_replies_send_one_callback() {
    let api = MockApi::discord().await;
    let interaction = command(&api);

    let (deferred, replied) = tokio::join!(
        interaction.defer(false),
        interaction.send_reply(CreateMessage::new().content("pong"), false),
    );
    deferred.unwrap();
    replied.unwrap();

    assert_eq!(api.requests_to("/callback").len(), 1);
    assert!(interaction.is_acknowledged().await);
}

#[tokio::test]
async fn first_reply_is_the_callback() {
    let api = MockApi::discord().await;
    let interaction = command(&api);

    let first = interaction.send_reply("pong", true).await.unwrap();
    assert!(first.is_none());

    let callbacks = api.requests_to("/callback");
    assert_eq!(callbacks.len(), 1);
    assert_eq!(callbacks[0].method, Method::POST);
    assert_eq!(callbacks[0].path, "/api/v10/interactions/846962681424216064/aW50ZXJhY3Rpb24/callback");
    let body = callbacks[0].json();
    assert_eq!(body["type"], 4);
    assert_eq!(body["data"]["content"], "pong");
    assert_eq!(body["data"]["flags"], 64);
    assert_eq!(callbacks[0].headers["authorization"], "Bot Mjg4NzYwMjQxMzYzODc3ODg4.C_ikow.j3VupLBuE1QWZng3TMGH0z_UAwg");

    let second = interaction.send_reply("again", false).await.unwrap().unwrap();
    assert_eq!(second.content, "again");

    let follow_ups = api.requests_to("/webhooks/");
    assert_eq!(follow_ups.len(), 1);
    assert_eq!(
        follow_ups[0].path,
        format!("/api/v10/webhooks/{}/aW50ZXJhY3Rpb24?wait=true", common::APPLICATION_ID)
    );
    assert_eq!(api.requests_to("/callback").len(), 1);
}

#[tokio::test]
async fn preconditions_send_nothing() {
    let api = MockApi::discord().await;
    let interaction = command(&api);

    let edit = interaction.edit_reply("x", false).await.unwrap_err();
    assert!(matches!(
        edit,
        Error::Interaction(InteractionError::NotAcknowledged(ReplyAction::Edit))
    ));

    let delete = interaction.delete_reply().await.unwrap_err();
    assert!(matches!(
        delete,
        Error::Interaction(InteractionError::NotAcknowledged(ReplyAction::Delete))
    ));

    let follow_up = interaction.send_follow_up("x", false).await.unwrap_err();
    assert!(matches!(
        follow_up,
        Error::Interaction(InteractionError::NotAcknowledged(ReplyAction::FollowUp))
    ));

    let edit_follow_up = interaction.edit_follow_up(MessageId::new(5), "x").await.unwrap_err();
    assert!(matches!(
        edit_follow_up,
        Error::Interaction(InteractionError::NotAcknowledged(ReplyAction::EditFollowUp(_)))
    ));
    assert_eq!(
        edit_follow_up.to_string(),
        "Interaction must be acknowledged before editing a follow-up"
    );

    let delete_follow_up = interaction.delete_follow_up(MessageId::new(5)).await.unwrap_err();
    assert!(matches!(
        delete_follow_up,
        Error::Interaction(InteractionError::NotAcknowledged(ReplyAction::DeleteFollowUp(_)))
    ));

    assert!(api.requests().is_empty());
    assert!(!interaction.is_acknowledged().await);
}

#[tokio::test]
async fn edits_and_deletions_go_through_the_webhook() {
    let api = MockApi::discord().await;
    let interaction = command(&api);
    let webhook = format!("/api/v10/webhooks/{}/aW50ZXJhY3Rpb24", common::APPLICATION_ID);

    interaction.defer(false).await.unwrap();
    // A second deferral is a no-op.
    interaction.defer(true).await.unwrap();
    assert_eq!(api.requests_to("/callback")[0].json()["type"], 5);

    let edited = interaction.edit_reply("done", false).await.unwrap();
    assert_eq!(edited.content, "done");
    interaction.delete_reply().await.unwrap();

    let follow_up = interaction.send_follow_up("more", true).await.unwrap();
    interaction.edit_follow_up(follow_up.id, "less").await.unwrap();
    interaction.delete_follow_up(follow_up.id).await.unwrap();

    let requests: Vec<_> =
        api.requests().into_iter().map(|request| (request.method, request.path)).collect();
    assert_eq!(requests, vec![
        (
            Method::POST,
            "/api/v10/interactions/846962681424216064/aW50ZXJhY3Rpb24/callback".to_owned()
        ),
        (Method::PATCH, format!("{webhook}/messages/@original")),
        (Method::DELETE, format!("{webhook}/messages/@original")),
        (Method::POST, format!("{webhook}?wait=true")),
        (Method::PATCH, format!("{webhook}/messages/1100")),
        (Method::DELETE, format!("{webhook}/messages/1100")),
    ]);
}

#[tokio::test]
async fn failed_follow_up_reply_is_expired() {
    let api = MockApi::start(|request, _| {
        if request.path.contains("/webhooks/") {
            Reply::json(json!({"message": "Unknown Webhook", "code": 10015})).status(404)
        } else {
            common::default_reply(request)
        }
    })
    .await;
    let interaction = command(&api);

    interaction.send_reply("first", false).await.unwrap();
    let err = interaction.send_reply("second", false).await.unwrap_err();

    let Error::Interaction(why) = err else { panic!("unexpected error: {err:?}") };
    assert!(why.is_expired());
}

#[tokio::test]
async fn rejected_callback_leaves_interaction_unacknowledged() {
    let api = MockApi::start(|request, count| {
        if count == 0 {
            Reply::json(json!({"message": "Internal Server Error", "code": 0})).status(500)
        } else {
            common::default_reply(request)
        }
    })
    .await;
    let interaction = command(&api);

    assert!(matches!(interaction.defer(false).await, Err(Error::Http(_))));
    assert!(!interaction.is_acknowledged().await);

    interaction.defer(false).await.unwrap();
    assert!(interaction.is_acknowledged().await);
    assert_eq!(api.requests_to("/callback").len(), 2);
}

#[tokio::test]
async fn component_acknowledgement_is_sent_once() {
    let api = MockApi::discord().await;
    let click: ComponentInteraction =
        decode(&api, &common::component_payload("confirm")).component().unwrap();

    click.acknowledge().await.unwrap();
    click.acknowledge().await.unwrap();

    let callbacks = api.requests_to("/callback");
    assert_eq!(callbacks.len(), 1);
    assert_eq!(callbacks[0].json(), json!({"type": 6}));

    let edited = click.edit_message(CreateMessage::new().content("confirmed")).await.unwrap();
    assert_eq!(edited.content, "confirmed");
    assert_eq!(api.requests_to("/messages/@original")[0].method, Method::PATCH);
}

#[tokio::test]
async fn suggestions_are_one_shot() {
    let api = MockApi::discord().await;
    let payload = common::autocomplete_payload(
        "weather",
        json!([{"name": "city", "type": 3, "value": "Ber", "focused": true}]),
    );
    let autocomplete: AutocompleteInteraction = decode(&api, &payload).autocomplete().unwrap();
    assert_eq!(autocomplete.focused.value, "Ber");

    let choices = (0..30).map(|i| AutocompleteChoice::new(format!("Berlin {i}"), i)).collect();
    autocomplete.suggest(choices).await.unwrap();

    let body = api.requests_to("/callback")[0].json();
    assert_eq!(body["type"], 8);
    assert_eq!(body["data"]["choices"].as_array().unwrap().len(), 25);

    let again = autocomplete.suggest(Vec::new()).await.unwrap_err();
    assert!(matches!(again, Error::Interaction(InteractionError::AlreadyResponded)));
    assert_eq!(api.requests().len(), 1);
}
