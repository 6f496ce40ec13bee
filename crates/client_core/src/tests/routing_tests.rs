use super::*;
use futures::FutureExt;

fn recording_handler(log: Arc<Mutex<Vec<(RouteName, RouteParams)>>>, route: RouteName) -> RouteHandler {
    Arc::new(move |params: RouteParams| {
        let log = Arc::clone(&log);
        async move {
            log.lock().push((route, params));
        }
        .boxed()
    })
}

fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn builds_fragment_with_and_without_params() {
    assert_eq!(build_fragment("", &BTreeMap::new()), "");
    assert_eq!(build_fragment("", &params(&[("q", "foo")])), "?q=foo");
    assert_eq!(
        build_fragment("", &params(&[("q", "a b&c")])),
        "?q=a+b%26c"
    );
}

#[test]
fn matches_main_and_edit_routes() {
    let (route, main) = match_fragment("?q=foo").expect("main");
    assert_eq!(route, RouteName::Main);
    assert_eq!(main.param("q"), Some("foo"));
    assert_eq!(main.id, None);

    let (route, edit) = match_fragment("edit/42/").expect("edit");
    assert_eq!(route, RouteName::Edit);
    assert_eq!(edit.id.as_deref(), Some("42"));

    let (route, edit) = match_fragment("/edit/7/?q=a+b").expect("edit with query");
    assert_eq!(route, RouteName::Edit);
    assert_eq!(edit.param("q"), Some("a b"));

    assert!(match_fragment("users/7/").is_none());
    assert!(match_fragment("edit/").is_none());
}

#[test]
fn normalizes_root_paths() {
    assert_eq!(normalize_root(""), "/");
    assert_eq!(normalize_root("admin/users"), "/admin/users/");
    assert_eq!(normalize_root("/admin/users/"), "/admin/users/");
}

#[tokio::test]
async fn start_dispatches_initial_location_relative_to_root() {
    let router = HistoryRouter::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    router.on(RouteName::Main, recording_handler(Arc::clone(&log), RouteName::Main));
    router.on(RouteName::Edit, recording_handler(Arc::clone(&log), RouteName::Edit));

    let matched = router
        .start(HistoryOptions::push_state("/admin/users"), "/admin/users/edit/9/")
        .await
        .expect("start");

    assert!(matched);
    assert_eq!(router.current_fragment().as_deref(), Some("edit/9/"));
    assert_eq!(router.current_url().as_deref(), Some("/admin/users/edit/9/"));
    let log = log.lock();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].0, RouteName::Edit);
    assert_eq!(log[0].1.id.as_deref(), Some("9"));
}

#[tokio::test]
async fn start_accepts_bare_root_with_query() {
    let router = HistoryRouter::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    router.on(RouteName::Main, recording_handler(Arc::clone(&log), RouteName::Main));

    router
        .start(HistoryOptions::push_state("/admin/users/"), "/admin/users?q=bob")
        .await
        .expect("start");

    assert_eq!(router.current_fragment().as_deref(), Some("?q=bob"));
    assert_eq!(log.lock()[0].1.param("q"), Some("bob"));
}

#[tokio::test]
async fn start_rejects_location_outside_root_and_second_start() {
    let router = HistoryRouter::new();
    let err = router
        .start(HistoryOptions::push_state("/admin/users/"), "/projects/")
        .await
        .expect_err("outside root");
    assert!(matches!(err, RoutingError::OutsideRoot { .. }));
    assert!(!router.is_started());

    router
        .start(HistoryOptions::push_state("/"), "/")
        .await
        .expect("start");
    let err = router
        .start(HistoryOptions::push_state("/"), "/")
        .await
        .expect_err("second start");
    assert_eq!(err, RoutingError::AlreadyStarted);
}

#[tokio::test]
async fn navigate_pushes_without_dispatching_and_skips_duplicates() {
    let router = HistoryRouter::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    router.on(RouteName::Main, recording_handler(Arc::clone(&log), RouteName::Main));
    router.on(RouteName::Edit, recording_handler(Arc::clone(&log), RouteName::Edit));
    router
        .start(HistoryOptions::push_state("/"), "/")
        .await
        .expect("start");
    log.lock().clear();

    router.navigate("?q=a");
    router.navigate("?q=a");
    router.navigate("edit/3/");

    assert_eq!(router.entries(), vec!["", "?q=a", "edit/3/"]);
    assert!(log.lock().is_empty());
}

#[tokio::test]
async fn back_and_forward_dispatch_handlers_and_navigate_truncates_forward_entries() {
    let router = HistoryRouter::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    router.on(RouteName::Main, recording_handler(Arc::clone(&log), RouteName::Main));
    router.on(RouteName::Edit, recording_handler(Arc::clone(&log), RouteName::Edit));
    router
        .start(HistoryOptions::push_state("/"), "/")
        .await
        .expect("start");
    router.navigate("?q=a");
    router.navigate("edit/3/");
    log.lock().clear();

    assert!(router.back().await.expect("back"));
    assert_eq!(router.current_fragment().as_deref(), Some("?q=a"));
    assert!(router.forward().await.expect("forward"));
    assert_eq!(router.current_fragment().as_deref(), Some("edit/3/"));
    assert!(!router.forward().await.expect("forward at end"));

    {
        let log = log.lock();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].0, RouteName::Main);
        assert_eq!(log[1].0, RouteName::Edit);
    }

    router.back().await.expect("back");
    router.navigate("?q=b");
    assert_eq!(router.entries(), vec!["", "?q=a", "?q=b"]);
}

#[tokio::test]
async fn back_before_start_is_an_error() {
    let router = HistoryRouter::new();
    assert_eq!(router.back().await, Err(RoutingError::NotStarted));
    router.navigate("?q=ignored");
    assert!(router.entries().is_empty());
}
