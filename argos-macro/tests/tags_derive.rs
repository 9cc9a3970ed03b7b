use argos::{Root, Spec, TagValues, Tags};

#[test]
fn test_single_field_tags() {
    #[derive(Tags)]
    struct SingleTag {
        event_type: String,
    }

    let tags = SingleTag {
        event_type: "stake".to_string(),
    };

    assert_eq!(SingleTag::NAMES, &["event_type"]);
    assert_eq!(tags.values(), vec!["stake".to_string()]);
}

#[test]
fn test_fields_keep_declaration_order() {
    #[derive(Tags)]
    struct Request {
        method: String,
        status: u32,
        cached: bool,
    }

    let tags = Request {
        method: "GET".to_string(),
        status: 200,
        cached: false,
    };

    assert_eq!(Request::NAMES, &["method", "status", "cached"]);
    assert_eq!(tags.values(), vec!["GET", "200", "false"]);
}

#[test]
fn test_renamed_field() {
    #[derive(Tags)]
    struct Request {
        #[tag(name = "status_code")]
        status: u16,
        path: &'static str,
    }

    assert_eq!(Request::NAMES, &["status_code", "path"]);
    assert_eq!(
        Request {
            status: 404,
            path: "/users"
        }
        .values(),
        vec!["404", "/users"]
    );
}

#[test]
fn test_generic_fields() {
    #[derive(Tags)]
    struct Generic<T> {
        value: T,
    }

    assert_eq!(Generic::<u8>::NAMES, &["value"]);
    assert_eq!(Generic { value: 7u8 }.values(), vec!["7"]);
}

#[test]
fn test_drives_vector_declaration_and_lookup() {
    #[derive(Tags)]
    struct Call {
        procedure: &'static str,
        caller: &'static str,
    }

    let root = Root::new();
    let calls = root
        .scope()
        .counter_vector(Spec::new("calls", "Calls served.").var_tags_of::<Call>())
        .unwrap();

    let call = Call {
        procedure: "get_user",
        caller: "web",
    };
    calls.must_get_tagged(&call).inc();
    calls.get_tagged(&call).unwrap().inc();
    assert_eq!(calls.must_get(&[("procedure", "get_user"), ("caller", "web")]).load(), 2);

    let snap = root.snapshot();
    assert_eq!(snap.counters.len(), 1);
    assert_eq!(snap.counters[0].value, 2);
}

#[test]
fn test_raw_identifier_field() {
    #[derive(Tags)]
    struct Event {
        r#type: &'static str,
    }

    assert_eq!(Event::NAMES, &["type"]);
    assert_eq!(Event { r#type: "login" }.values(), vec!["login"]);

    let root = Root::new();
    let events = root
        .scope()
        .counter_vector(Spec::new("events", "help").var_tags_of::<Event>())
        .unwrap();
    events.must_get(&[("type", "login")]).inc();
    assert_eq!(events.must_get_tagged(&Event { r#type: "login" }).load(), 1);
}
