//! Tests for validation passes, supersession and the form-wide flag.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use formguard::observable::Observable;
use formguard::validation::{
    FieldState, REQUIRED_MESSAGE, Rule, ValidationContext, ValidationError, required, rule,
};

/// Rule that counts how often it runs.
fn counting_rule(runs: &Arc<AtomicUsize>) -> Rule {
    let runs = Arc::clone(runs);
    rule(move |_| {
        runs.fetch_add(1, Ordering::SeqCst);
    })
}

/// Rule that reads its delay and verdict when it runs and reports after the
/// delay.
fn delayed_rule(delay_ms: Observable<u64>, failure: Observable<Option<String>>) -> Rule {
    rule(move |event| {
        let delay = Duration::from_millis(delay_ms.get());
        let failure = failure.get();
        let handle = event.clone();
        event.pending(async move {
            tokio::time::sleep(delay).await;
            if let Some(message) = failure {
                handle.fail(message);
            }
        });
    })
}

#[tokio::test(start_paused = true)]
async fn test_sync_failure_commits_errors() {
    let context = ValidationContext::new();
    let id = context.register(Some(required("")));

    assert_eq!(context.validate_field(id).await, Ok(false));
    assert_eq!(
        context.field(id),
        Some(FieldState {
            errors: vec![REQUIRED_MESSAGE.to_string()]
        })
    );
    assert!(context.is_invalid());
}

#[tokio::test(start_paused = true)]
async fn test_field_without_rule_is_valid() {
    let context = ValidationContext::new();
    let id = context.register(None);

    assert_eq!(context.validate_field(id).await, Ok(true));
    assert!(!context.is_invalid());
}

#[tokio::test(start_paused = true)]
async fn test_pending_failure_commits_after_settling() {
    let context = ValidationContext::new();
    let id = context.register(Some(delayed_rule(
        Observable::new(30),
        Observable::new(Some("late failure".to_string())),
    )));

    let pass = tokio::spawn({
        let context = context.clone();
        async move { context.validate_field(id).await }
    });

    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(!context.is_invalid());
    assert_eq!(context.field(id), Some(FieldState::default()));

    assert_eq!(pass.await.unwrap(), Ok(false));
    assert!(context.is_invalid());
    assert_eq!(
        context.field(id).unwrap().errors,
        vec!["late failure".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn test_stale_failing_pass_does_not_overwrite_newer_pass() {
    let context = ValidationContext::new();
    let delay = Observable::new(80);
    let failure = Observable::new(Some("stale".to_string()));
    let id = context.register(Some(delayed_rule(delay.clone(), failure.clone())));

    let first = tokio::spawn({
        let context = context.clone();
        async move { context.validate_field(id).await }
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    delay.set(5);
    failure.set(None);
    let second = context.validate_field(id).await;

    assert_eq!(second, Ok(true));
    assert_eq!(
        first.await.unwrap(),
        Err(ValidationError::Superseded { field: id })
    );
    assert!(!context.field(id).unwrap().has_errors());
    assert!(!context.is_invalid());
}

#[tokio::test(start_paused = true)]
async fn test_stale_passing_pass_does_not_clear_newer_failure() {
    let context = ValidationContext::new();
    let delay = Observable::new(80);
    let failure = Observable::new(None);
    let id = context.register(Some(delayed_rule(delay.clone(), failure.clone())));

    let first = tokio::spawn({
        let context = context.clone();
        async move { context.validate_field(id).await }
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    delay.set(5);
    failure.set(Some("current".to_string()));
    assert_eq!(context.validate_field(id).await, Ok(false));

    assert!(first.await.unwrap().unwrap_err().is_superseded());
    assert_eq!(
        context.field(id).unwrap().errors,
        vec!["current".to_string()]
    );
    assert!(context.is_invalid());
}

#[tokio::test(start_paused = true)]
async fn test_unknown_field() {
    let context = ValidationContext::new();
    let id = context.register(None);
    assert!(context.unregister(id));
    assert!(!context.unregister(id));

    assert_eq!(
        context.validate_field(id).await,
        Err(ValidationError::UnknownField(id))
    );
    assert!(context.field(id).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_form_pass_ors_field_results() {
    let context = ValidationContext::new();
    let name = Observable::new(String::from("DakotaEmber"));
    let agree = Observable::new(false);
    context.register(Some(required(&name)));
    let terms = context.register(Some(required(&agree)));

    assert_eq!(context.validate().await, Ok(false));
    assert!(context.is_invalid());

    agree.set(true);
    assert_eq!(context.validate().await, Ok(true));
    assert!(!context.is_invalid());

    agree.set(false);
    assert_eq!(context.validate_field(terms).await, Ok(false));
    assert!(context.is_invalid());

    assert!(context.unregister(terms));
    assert!(!context.is_invalid());
}

#[tokio::test(start_paused = true)]
async fn test_interrupted_form_pass_reports_superseded() {
    let context = ValidationContext::new();
    let delay = Observable::new(60);
    let id = context.register(Some(delayed_rule(delay.clone(), Observable::new(None))));

    let form_pass = tokio::spawn({
        let context = context.clone();
        async move { context.validate().await }
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    delay.set(0);
    assert_eq!(context.validate_field(id).await, Ok(true));

    assert_eq!(
        form_pass.await.unwrap(),
        Err(ValidationError::Superseded { field: id })
    );
}

#[tokio::test(start_paused = true)]
async fn test_invalid_flag_notifies_only_on_change() {
    let context = ValidationContext::new();
    let value = Observable::new(String::new());
    let id = context.register(Some(required(&value)));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let _subscription = context.invalid().subscribe({
        let seen = Arc::clone(&seen);
        move |invalid| seen.lock().unwrap().push(*invalid)
    });

    context.validate_field(id).await.unwrap();
    context.validate_field(id).await.unwrap();
    value.set("x".to_string());
    context.validate_field(id).await.unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![true, false]);
}

#[tokio::test(start_paused = true)]
async fn test_field_state_observable_updates_on_commit() {
    let context = ValidationContext::new();
    let id = context.register(Some(required(false)));
    let state = context.field_state(id).unwrap();

    let commits = Arc::new(AtomicUsize::new(0));
    let _subscription = state.subscribe({
        let commits = Arc::clone(&commits);
        move |_| {
            commits.fetch_add(1, Ordering::SeqCst);
        }
    });

    context.validate_field(id).await.unwrap();
    assert_eq!(commits.load(Ordering::SeqCst), 1);
    assert!(state.get().has_errors());
}

#[tokio::test(start_paused = true)]
async fn test_change_driver_revalidates_watched_field() {
    let context = ValidationContext::new();
    let name = Observable::new(String::from("DakotaEmber"));
    let id = context.register_watching(Some(required(&name)), &name);

    tokio::spawn(context.take_change_driver().unwrap().run());
    assert!(context.take_change_driver().is_none());

    name.set(String::new());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(context.field(id).unwrap().has_errors());
    assert!(context.is_invalid());

    name.set("Ember".to_string());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!context.field(id).unwrap().has_errors());
    assert!(!context.is_invalid());
}

#[tokio::test(start_paused = true)]
async fn test_unregister_removes_watch() {
    let context = ValidationContext::new();
    let name = Observable::new(String::new());
    let id = context.register_watching(None, &name);
    assert_eq!(name.listener_count(), 1);

    context.unregister(id);
    assert_eq!(name.listener_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_listener_can_unregister_fields() {
    let context = ValidationContext::new();
    let failing = context.register(Some(required("")));
    let section = context.register(None);

    let _subscription = context.invalid().subscribe({
        let context = context.clone();
        move |invalid| {
            if *invalid {
                context.unregister(section);
            }
        }
    });

    assert_eq!(context.validate_field(failing).await, Ok(false));
    assert_eq!(context.field_ids(), vec![failing]);
    assert!(context.is_invalid());
    assert!(context.invalid().get());
}

#[tokio::test(start_paused = true)]
async fn test_field_state_listener_can_start_another_pass() {
    let context = ValidationContext::new();
    let value = Observable::new(String::new());
    let id = context.register(Some(required(&value)));

    let states = Arc::new(Mutex::new(Vec::new()));
    let _subscription = context.field_state(id).unwrap().subscribe({
        let context = context.clone();
        let value = value.clone();
        let states = Arc::clone(&states);
        move |state: &FieldState| {
            states.lock().unwrap().push(state.has_errors());
            if state.has_errors() {
                value.set("fixed".to_string());
                let context = context.clone();
                tokio::spawn(async move { context.validate_field(id).await });
            }
        }
    });

    assert_eq!(context.validate_field(id).await, Ok(false));
    tokio::time::sleep(Duration::from_millis(1)).await;

    assert_eq!(*states.lock().unwrap(), vec![true, false]);
    assert!(!context.is_invalid());
    assert!(!context.invalid().get());
}

#[tokio::test(start_paused = true)]
async fn test_change_driver_collapses_queued_changes() {
    let context = ValidationContext::new();
    let name = Observable::new(String::new());
    let runs = Arc::new(AtomicUsize::new(0));
    context.register_watching(Some(counting_rule(&runs)), &name);

    tokio::spawn(context.take_change_driver().unwrap().run());
    name.set("D".to_string());
    name.set("Da".to_string());
    name.set("Dak".to_string());
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(runs.load(Ordering::SeqCst), 1);

    name.set("Dako".to_string());
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_change_driver_stops_when_context_dropped() {
    let context = ValidationContext::new();
    let name = Observable::new(String::new());
    context.register_watching(None, &name);

    let driver = tokio::spawn(context.take_change_driver().unwrap().run());
    drop(context);

    let stopped = tokio::time::timeout(Duration::from_secs(1), driver).await;
    assert!(matches!(stopped, Ok(Ok(()))));
    assert_eq!(name.listener_count(), 0);
}
