mod common;

use std::sync::Arc;

use common::{RecordingStore, StoreCall};
use rtdbql::{
    Arguments, Directive, DirectiveSet, Envelope, FieldInfo, FieldResolver, MutationDirective,
    MutationKind, ResolvedValue, StoreError, VisitContext,
};
use serde_json::{json, Value};

fn args(v: Value) -> Arguments {
    v.as_object().cloned().unwrap_or_default()
}

fn mutation(kind: MutationKind, path: &str, ty: Option<&str>) -> DirectiveSet {
    let mut m = MutationDirective::new(kind, path).unwrap();
    m.type_name = ty.map(str::to_string);
    DirectiveSet::new().with(Directive::Mutation(m)).unwrap()
}

#[tokio::test]
async fn create_user_push_then_read_back_name() {
    let store = RecordingStore::new();
    let mut ctx = VisitContext::new(store.clone());
    let resolver = FieldResolver::new();

    // createUser @rtdbPush(ref: "/users", type: "User")
    let directives = mutation(MutationKind::Push, "/users", Some("User"));
    let created = resolver
        .resolve(
            "createUser",
            &ResolvedValue::Null,
            &args(json!({ "input": { "name": "Ana" } })),
            &mut ctx,
            &FieldInfo::branch("createUser", &directives),
        )
        .await
        .unwrap();

    let ResolvedValue::Envelope(envelope) = &created else {
        panic!("expected envelope, got {created:?}");
    };
    let key = envelope.generated_key.clone().unwrap();
    assert_eq!(
        *envelope,
        Envelope::new(json!({ "name": "Ana" }))
            .with_generated_key(key.clone())
            .with_type_tag(Some("User".to_string()))
    );

    let writes: Vec<_> = store
        .calls()
        .into_iter()
        .filter(|c| !matches!(c, StoreCall::Push(_)))
        .collect();
    assert_eq!(writes, vec![StoreCall::Set(format!("/users/{key}"), json!({ "name": "Ana" }))]);

    // name (no directives) under createUser
    let none = DirectiveSet::new();
    let name = resolver
        .resolve("name", &created, &Arguments::new(), &mut ctx, &FieldInfo::leaf("name", &none))
        .await
        .unwrap();
    assert_eq!(name, ResolvedValue::Scalar(json!("Ana")));
}

#[tokio::test]
async fn delete_user_issues_exactly_one_remove() {
    let store = RecordingStore::new();
    let mut ctx = VisitContext::new(store.clone());
    let resolver = FieldResolver::new();
    let directives = mutation(MutationKind::Remove, "/users/42", None);

    let out = resolver
        .resolve(
            "deleteUser",
            &ResolvedValue::Null,
            &args(json!({ "input": { "ignored": true } })),
            &mut ctx,
            &FieldInfo::branch("deleteUser", &directives),
        )
        .await
        .unwrap();

    assert_eq!(out, ResolvedValue::Envelope(Envelope::empty()));
    assert_eq!(store.calls(), vec![StoreCall::Remove("/users/42".to_string())]);
}

#[tokio::test]
async fn set_twice_is_idempotent() {
    let store = RecordingStore::new();
    let resolver = FieldResolver::new();
    let directives = mutation(MutationKind::Set, "/settings/theme", Some("Theme"));
    let input = args(json!({ "input": { "mode": "dark" } }));

    let mut results = Vec::new();
    for _ in 0..2 {
        let mut ctx = VisitContext::new(store.clone());
        let out = resolver
            .resolve("setTheme", &ResolvedValue::Null, &input, &mut ctx, &FieldInfo::branch("setTheme", &directives))
            .await
            .unwrap();
        assert_eq!(store.inner.get("/settings/theme").unwrap(), json!({ "mode": "dark" }));
        results.push(out);
    }

    assert_eq!(results[0], results[1]);
    assert_eq!(results[0].payload(), Some(&json!({ "mode": "dark" })));
}

#[tokio::test]
async fn push_twice_yields_distinct_keys() {
    let store = RecordingStore::new();
    let mut ctx = VisitContext::new(store.clone());
    let resolver = FieldResolver::new();
    let directives = mutation(MutationKind::Push, "/messages", Some("Message"));
    let input = args(json!({ "input": { "text": "hi" } }));
    let info = FieldInfo::branch("send", &directives);

    let a = resolver.resolve("send", &ResolvedValue::Null, &input, &mut ctx, &info).await.unwrap();
    let b = resolver.resolve("send", &ResolvedValue::Null, &input, &mut ctx, &info).await.unwrap();

    assert_ne!(a.generated_key(), b.generated_key());
    assert_eq!(a.payload(), Some(&json!({ "text": "hi" })));
    assert_eq!(b.payload(), Some(&json!({ "text": "hi" })));

    let stored = store.inner.get("/messages").unwrap();
    assert_eq!(stored.as_object().map(serde_json::Map::len), Some(2));
}

#[tokio::test]
async fn remove_envelope_is_null_for_any_input() {
    let resolver = FieldResolver::new();
    let directives = mutation(MutationKind::Remove, "/tmp", Some("Tmp"));

    for input in [json!(null), json!(1), json!({ "a": [1, 2] })] {
        let store = RecordingStore::new();
        let mut ctx = VisitContext::new(store);
        let out = resolver
            .resolve("rm", &ResolvedValue::Null, &args(json!({ "input": input })), &mut ctx, &FieldInfo::leaf("rm", &directives))
            .await
            .unwrap();
        assert_eq!(out.to_json(), json!({ "payload": null }));
    }
}

#[tokio::test]
async fn key_leaf_sees_most_recent_mutation_path() {
    let store = RecordingStore::new();
    let mut ctx = VisitContext::new(store.clone());
    let resolver = FieldResolver::new();
    let key = DirectiveSet::new().with(Directive::Key).unwrap();

    let first = mutation(MutationKind::Set, "/users/$id", None);
    let created = resolver
        .resolve(
            "setUser",
            &ResolvedValue::Null,
            &args(json!({ "id": 7, "input": { "name": "Ana" } })),
            &mut ctx,
            &FieldInfo::branch("setUser", &first),
        )
        .await
        .unwrap();
    let id = resolver
        .resolve("id", &created, &Arguments::new(), &mut ctx, &FieldInfo::leaf("id", &key))
        .await
        .unwrap();
    assert_eq!(id, ResolvedValue::Scalar(json!("7")));

    let second = mutation(MutationKind::Update, "/teams/blue", None);
    resolver
        .resolve(
            "renameTeam",
            &ResolvedValue::Null,
            &args(json!({ "input": { "title": "Blue" } })),
            &mut ctx,
            &FieldInfo::branch("renameTeam", &second),
        )
        .await
        .unwrap();
    let id = resolver
        .resolve("id", &created, &Arguments::new(), &mut ctx, &FieldInfo::leaf("id", &key))
        .await
        .unwrap();
    assert_eq!(id, ResolvedValue::Scalar(json!("blue")));

    // A fresh execution starts without a recorded path.
    let mut fresh = VisitContext::new(store);
    let id = resolver
        .resolve("id", &created, &Arguments::new(), &mut fresh, &FieldInfo::leaf("id", &key))
        .await
        .unwrap();
    assert!(id.is_null());
}

#[tokio::test]
async fn push_key_ignores_arguments() {
    let store = RecordingStore::new();
    let mut ctx = VisitContext::new(store);
    let resolver = FieldResolver::new();
    let push_key = DirectiveSet::new().with(Directive::PushKey).unwrap();
    let root: ResolvedValue = Envelope::new(json!({ "a": 1 })).with_generated_key("-Nx").into();

    for input in [Arguments::new(), args(json!({ "input": "other" }))] {
        let out = resolver
            .resolve("id", &root, &input, &mut ctx, &FieldInfo::leaf("id", &push_key))
            .await
            .unwrap();
        assert_eq!(out, ResolvedValue::Scalar(json!("-Nx")));
    }
}

#[tokio::test]
async fn store_failure_propagates_unchanged() {
    let store = RecordingStore::new();
    store.deny_writes("rules rejected /users/42");
    let mut ctx = VisitContext::new(store.clone());
    let resolver = FieldResolver::new();
    let directives = mutation(MutationKind::Update, "/users/42", Some("User"));

    let err = resolver
        .resolve(
            "updateUser",
            &ResolvedValue::Null,
            &args(json!({ "input": { "age": 31 } })),
            &mut ctx,
            &FieldInfo::branch("updateUser", &directives),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err.as_store(),
        Some(StoreError::PermissionDenied(msg)) if msg == "rules rejected /users/42"
    ));
    assert!(!err.is_retryable());
    assert_eq!(store.calls().len(), 1);
    assert_eq!(store.inner.snapshot().unwrap(), Value::Null);
}
