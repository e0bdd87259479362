//! End-to-end run of every client operation against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives a `Session` backed
//! by `UreqTransport` over real HTTP.

use sensibo_core::{
    AcState, ApiError, ClientConfig, FanLevel, Mode, Session, Swing, UreqTransport,
};
use serde_json::json;

/// Start the mock server on a random port and return its base URL.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, mock_server::DEFAULT_API_KEY).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn session(base_url: &str) -> Session<UreqTransport> {
    Session::new(ClientConfig::new(mock_server::DEFAULT_API_KEY).with_base_url(base_url))
}

#[test]
fn device_lifecycle() {
    let base_url = start_server();
    let session = session(&base_url);

    // Step 1: list pods.
    let pods = session.list_devices().unwrap();
    assert_eq!(pods, vec!["abc123", "def456"]);
    let pod = pods[0].as_str();

    // Step 2: device info is passed through untouched.
    let info = session.get_device_info(pod).unwrap();
    assert_eq!(info["id"], json!(pod));
    assert_eq!(info["room"]["name"], json!("Living room"));

    // Step 3: a fresh pod has one history entry; count=1 is still a list.
    let states = session.list_states(pod, Some(1)).unwrap();
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].ac_state.on, Some(false));

    // Step 4: partial update leaves untouched fields alone.
    let update = AcState::new().on(true).mode(Mode::Heat).temperature(26);
    let applied = session.set_state(pod, &update).unwrap();
    assert!(applied.is_success());
    assert_eq!(applied.ac_state.on, Some(true));
    assert_eq!(applied.ac_state.mode, Some(Mode::Heat));
    assert_eq!(applied.ac_state.temperature, Some(serde_json::Number::from(26)));
    assert_eq!(applied.ac_state.fan_level, Some(FanLevel::Auto));
    assert_eq!(applied.ac_state.swing, Some(Swing::Stopped));

    // Step 5: an empty update is a no-op on the server.
    let noop = session.set_state(pod, &AcState::new()).unwrap();
    assert!(noop.changed_properties.is_empty());
    assert_eq!(noop.ac_state, applied.ac_state);

    // Step 6: single-property change.
    let patched = session
        .set_state_property(pod, "fanLevel", &json!("high"))
        .unwrap();
    assert_eq!(patched.changed_properties, vec!["fanLevel"]);
    assert_eq!(patched.ac_state.fan_level, Some(FanLevel::High));

    // Step 7: history is newest first and clamped.
    let states = session.list_states(pod, Some(500)).unwrap();
    assert_eq!(states.len(), 4);
    assert_eq!(states[0].id, patched.id);
    assert_eq!(states[2].id, applied.id);

    // Step 8: fetch an older entry by id.
    let fetched = session.get_state(pod, &applied.id).unwrap();
    assert_eq!(fetched.ac_state.fan_level, Some(FanLevel::Auto));

    // Step 9: smart mode toggle.
    let settings = session.get_smart_mode(pod).unwrap();
    assert_eq!(settings["enabled"], json!(false));
    let settings = session.set_smart_mode(pod, None).unwrap();
    assert_eq!(settings["enabled"], json!(false));
    let settings = session.set_smart_mode(pod, Some(true)).unwrap();
    assert_eq!(settings["enabled"], json!(true));

    // Step 10: the other pod was not touched.
    let other = session.list_states("def456", None).unwrap();
    assert_eq!(other.len(), 1);
}

#[test]
fn measurements() {
    let base_url = start_server();
    let session = session(&base_url);

    let current = session.probe_current("abc123").unwrap().unwrap();
    assert_eq!(current.seconds_ago, 37);
    assert_eq!(current.temperature, 23.4);
    assert_eq!(current.humidity, 51.2);

    // One day is four samples; humidity is missing for the last one.
    let rows = session.probe_historical("abc123", None).unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.windows(2).all(|w| w[0].time < w[1].time));

    // Days are clamped to a week.
    let rows = session.probe_historical("abc123", Some(30)).unwrap();
    assert_eq!(rows.len(), 27);
}

#[test]
fn errors() {
    let base_url = start_server();
    let session = session(&base_url);

    let err = session.get_device_info("missing").unwrap_err();
    assert!(matches!(err, ApiError::NotFound));

    let err = session.get_state("abc123", "missing").unwrap_err();
    assert!(matches!(err, ApiError::NotFound));

    let err = session
        .with_api_key("wrong")
        .list_devices()
        .unwrap_err();
    assert!(matches!(err, ApiError::HttpError { status: 401, .. }));

    let err = session
        .set_state(vec!["abc123", "def456"], &AcState::new().on(true))
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidArgument(_)));
    // Rejected before sending: the pod is unchanged.
    let states = session.list_states("abc123", None).unwrap();
    assert_eq!(states.len(), 1);
}

#[test]
fn unreachable_server_is_a_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let session = session(&format!("http://{addr}"));
    let err = session.list_devices().unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}
