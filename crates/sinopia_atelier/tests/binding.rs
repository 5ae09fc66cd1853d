//! Compile and bind tests.
//!
//! Time is driven explicitly: nothing renders until the runtime's scheduler
//! is flushed.

use std::rc::Rc;

use serde_json::json;
use sinopia_atelier::directives::TextHandler;
use sinopia_atelier::{compile, DirectiveSet, Runtime, View};
use sinopia_relief::NodeType;
use sinopia_tempera::{Object, Value};

fn runtime() -> Rc<Runtime> {
    Runtime::new(DirectiveSet::standard())
}

fn data(json: serde_json::Value) -> Object {
    Value::from_json(&json)
        .as_object()
        .cloned()
        .expect("test data is an object")
}

fn rendered(runtime: &Rc<Runtime>, markup: &str, data: &Object) -> View {
    let view = runtime.render_markup(markup, data);
    runtime.run_until_idle(16);
    view
}

// =============================================================================
// Paths
// =============================================================================

mod paths {
    use super::*;

    #[test]
    fn instances_resolve_paths_to_congruent_nodes() {
        let runtime = runtime();
        let template = runtime.template(
            r#"<section><h1 b:attr.title="title">{{ title }}</h1><p>{{ body }} and {{ more }}</p></section>"#,
        );

        let first_data = data(json!({ "title": "One", "body": "b1", "more": "m1" }));
        let second_data = data(json!({ "title": "Two", "body": "b2", "more": "m2" }));
        let first = runtime.render(&template, &first_data);
        let second = runtime.render(&template, &second_data);
        runtime.run_until_idle(16);

        first_data.set("body", Value::from("a much longer body"));
        runtime.run_until_idle(16);

        for binding in template.bindings() {
            let a = binding.path.resolve(first.root()).expect("path resolves in first");
            let b = binding.path.resolve(second.root()).expect("path resolves in second");
            assert_eq!(a.node_type(), b.node_type(), "at {}", binding.path);
            assert_eq!(a.tag(), b.tag(), "at {}", binding.path);
        }
        insta::assert_snapshot!(
            second.html(),
            @r#"<section><h1 title="Two"><!---->Two<!----></h1><p><!---->b2 and m2<!----></p></section>"#
        );
    }

    #[test]
    fn recompiling_gives_identical_paths() {
        let markup = "<ul><li>{{a}}{{b}}</li><li>x {{ c }} y</li></ul>";
        let runtime = runtime();
        let first = runtime.template(markup);
        let (fresh, _) = sinopia_armature::parse_template(markup, Default::default());
        let second = compile(&fresh, &DirectiveSet::standard());
        assert_eq!(first.bindings().paths(), second.paths());
    }

    #[test]
    fn compiled_content_has_nothing_left_to_bind() {
        let runtime = runtime();
        let template = runtime.template(r#"<p b:attr.id="id">{{ a }}{{ b }}</p>"#);
        let again = compile(&template.instantiate_content(), &DirectiveSet::standard());
        assert!(again.is_empty());
        assert_eq!(template.bindings().len(), 3);
    }

    #[test]
    fn token_placeholders_are_markers() {
        let runtime = runtime();
        let template = runtime.template("<p>{{ a }}</p>");
        let binding = template.bindings().iter().next().unwrap();
        let node = binding.path.resolve(template.content()).unwrap();
        assert_eq!(node.node_type(), NodeType::Marker);
        assert_eq!(node.node_value(), sinopia_atelier::TOKEN_MARKER);
    }
}

// =============================================================================
// Text, attr and style
// =============================================================================

mod directives {
    use super::*;

    #[test]
    fn text_tracks_data() {
        let runtime = runtime();
        let data = data(json!({ "user": { "name": "Ada" }, "count": 2 }));
        let view = rendered(&runtime, "<p>{{ user.name }} has {{ count * 2 }}</p>", &data);
        insta::assert_snapshot!(view.html(), @"<p><!---->Ada has 4<!----></p>");

        data.set("count", Value::from(5));
        runtime.run_until_idle(16);
        insta::assert_snapshot!(view.html(), @"<p><!---->Ada has 10<!----></p>");
    }

    #[test]
    fn attr_and_style_follow_truthiness() {
        let runtime = runtime();
        let data = data(json!({ "busy": true }));
        let view = rendered(
            &runtime,
            r#"<button b:attr.disabled="busy" b:style="{ color: busy ? 'gray' : 'black' }">Go</button>"#,
            &data,
        );
        insta::assert_snapshot!(view.html(), @r#"<button disabled="true" style="color: gray">Go</button>"#);

        data.set("busy", Value::Bool(false));
        runtime.run_until_idle(16);
        insta::assert_snapshot!(view.html(), @r#"<button style="color: black">Go</button>"#);
    }

    #[test]
    fn style_removes_empty_values() {
        let runtime = runtime();
        let data = data(json!({ "size": 12 }));
        let view = rendered(
            &runtime,
            r#"<div style="margin: 0" b:style="{ fontSize: size ? size + 'px' : null }"></div>"#,
            &data,
        );
        assert_eq!(view.html(), r#"<div style="margin: 0; font-size: 12px"></div>"#);

        data.set("size", Value::from(0));
        runtime.run_until_idle(16);
        assert_eq!(view.html(), r#"<div style="margin: 0"></div>"#);
    }

    #[test]
    fn evaluation_error_keeps_last_value() {
        let runtime = runtime();
        let data = data(json!({ "user": { "name": "Ada" } }));
        let view = rendered(&runtime, "<p>{{ user.name }}</p>", &data);

        data.set("user", Value::Null);
        runtime.run_until_idle(16);
        assert_eq!(view.html(), "<p><!---->Ada<!----></p>");
    }

    #[test]
    fn invalid_expression_renders_empty() {
        let runtime = runtime();
        let data = data(json!({}));
        let view = rendered(&runtime, "<p>{{ a + }}</p>", &data);
        assert_eq!(view.html(), "<p><!----><!----></p>");
    }
}

// =============================================================================
// Scheduling
// =============================================================================

mod scheduling {
    use super::*;

    #[test]
    fn synchronous_triggers_coalesce_into_one_evaluation() {
        let runtime = runtime();
        let data = data(json!({ "n": 1 }));
        let view = rendered(&runtime, "<p>{{ n }}</p>", &data);
        let handler = view.find_handler::<TextHandler>().unwrap();
        let updater = handler.updater().unwrap();
        assert_eq!(updater.evaluation_count(), 1);

        for n in 2..=6 {
            data.set("n", Value::from(n));
        }
        assert_eq!(runtime.scheduler().pending(), 1);
        runtime.flush();

        assert_eq!(updater.evaluation_count(), 2);
        assert_eq!(view.html(), "<p><!---->6<!----></p>");
    }

    #[test]
    fn nothing_renders_before_a_tick() {
        let runtime = runtime();
        let data = data(json!({ "n": 1 }));
        let view = runtime.render_markup("<p>{{ n }}</p>", &data);
        assert_eq!(view.html(), "<p><!----><!----></p>");
        assert_eq!(runtime.flush(), 1);
        assert_eq!(view.html(), "<p><!---->1<!----></p>");
    }

    #[test]
    fn destroy_is_idempotent_and_stops_updates() {
        let runtime = runtime();
        let data = data(json!({ "n": 1 }));
        let view = rendered(&runtime, "<p b:attr.title=\"n\">{{ n }}</p>", &data);

        data.set("n", Value::from(2));
        view.destroy();
        view.destroy();
        runtime.run_until_idle(16);

        assert!(view.is_destroyed());
        assert!(view.handlers().iter().all(|h| h.is_destroyed()));
        assert_eq!(view.html(), r#"<p title="1"><!---->1<!----></p>"#);
        assert_eq!(data.subscriber_count("n"), 0);

        data.set("n", Value::from(3));
        assert_eq!(runtime.scheduler().pending(), 0);
    }
}
