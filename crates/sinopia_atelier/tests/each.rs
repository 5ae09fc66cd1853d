//! List reconciliation tests for `_each`.

use std::rc::Rc;

use serde_json::json;
use sinopia_atelier::{DirectiveSet, EachHandler, LoopPhase, NodeHandler, RowKey, Runtime, View};
use sinopia_tempera::{Array, Object, Value};

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

fn each(view: &View) -> &EachHandler {
    view.find_handler::<EachHandler>().expect("view has a loop")
}

fn array(data: &Object, key: &str) -> Array {
    data.peek(key).as_array().cloned().expect("array entry")
}

// =============================================================================
// Iteration
// =============================================================================

mod iteration {
    use super::*;

    #[test]
    fn array_rows_with_index() {
        let runtime = runtime();
        let data = data(json!({ "items": ["a", "b"] }));
        let view = rendered(
            &runtime,
            r#"<ul><li _each="(item, i) of items" class="row">{{ i }}={{ item }}</li></ul>"#,
            &data,
        );
        insta::assert_snapshot!(
            view.html(),
            @r#"<ul><li class="row"><!---->0=a<!----></li><li class="row"><!---->1=b<!----></li><!----></ul>"#
        );
        assert_eq!(each(&view).phase(), LoopPhase::Populated);
    }

    #[test]
    fn object_rows_with_key_and_index() {
        let runtime = runtime();
        let data = data(json!({ "settings": { "theme": "dark", "size": 2 } }));
        let view = rendered(
            &runtime,
            r#"<dl><dt _each="(value, key, n) in settings">{{ n }}:{{ key }}={{ value }}</dt></dl>"#,
            &data,
        );
        insta::assert_snapshot!(
            view.html(),
            @"<dl><dt><!---->0:theme=dark<!----></dt><dt><!---->1:size=2<!----></dt><!----></dl>"
        );
    }

    #[test]
    fn rows_reach_root_data_explicitly() {
        let runtime = runtime();
        let data = data(json!({ "prefix": "#", "items": [1, 2] }));
        let view = rendered(
            &runtime,
            "<p><span _each=\"item of items\">{{ $data.prefix }}{{ item }}</span></p>",
            &data,
        );
        assert_eq!(
            view.html(),
            "<p><span><!---->#<!---->1<!----></span><span><!---->#<!---->2<!----></span><!----></p>"
        );

        data.set("prefix", Value::from("no."));
        runtime.run_until_idle(16);
        assert_eq!(
            view.html(),
            "<p><span><!---->no.<!---->1<!----></span><span><!---->no.<!---->2<!----></span><!----></p>"
        );
    }

    #[test]
    fn nested_loops() {
        let runtime = runtime();
        let data = data(json!({ "rows": [[1, 2], [3]] }));
        let view = rendered(
            &runtime,
            r#"<table><tr _each="row of rows"><td _each="cell of row">{{ cell }}</td></tr></table>"#,
            &data,
        );
        insta::assert_snapshot!(
            view.html(),
            @"<table><tr><td><!---->1<!----></td><td><!---->2<!----></td><!----></tr><tr><td><!---->3<!----></td><!----></tr><!----></table>"
        );
        assert_eq!(runtime.cached_templates(), 3);
    }

    #[test]
    fn push_renders_one_more_row() {
        let runtime = runtime();
        let data = data(json!({ "nums": [1] }));
        let view = rendered(&runtime, r#"<ol><li _each="n of nums">{{ n }}</li></ol>"#, &data);
        let first = each(&view).rows();

        array(&data, "nums").push(Value::from(2));
        array(&data, "nums").push(Value::from(3));
        assert_eq!(runtime.scheduler().pending(), 1);
        runtime.run_until_idle(16);

        let rows = each(&view).rows();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].ptr_eq(&first[0]));
        assert_eq!(
            view.html(),
            "<ol><li><!---->1<!----></li><li><!---->2<!----></li><li><!---->3<!----></li><!----></ol>"
        );
    }

    #[test]
    fn malformed_expression_renders_nothing() {
        let runtime = runtime();
        let data = data(json!({ "items": [1, 2] }));
        let view = rendered(&runtime, r#"<ul><li _each="items">x</li></ul>"#, &data);
        assert_eq!(view.html(), "<ul><!----></ul>");
        assert_eq!(each(&view).phase(), LoopPhase::Empty);
    }
}

// =============================================================================
// Reconciliation
// =============================================================================

mod reconciliation {
    use super::*;

    #[test]
    fn keyed_reorder_keeps_every_row_binder() {
        let runtime = runtime();
        let data = data(json!({
            "items": [
                { "id": 1, "v": "a" },
                { "id": 2, "v": "b" },
                { "id": 3, "v": "c" }
            ]
        }));
        let view = rendered(
            &runtime,
            r#"<ul><li _each="item of items" _key="item.id">{{ item.v }}</li></ul>"#,
            &data,
        );
        let handler = each(&view);
        assert!(handler.is_keyed());
        let before = handler.rows();

        let items = array(&data, "items");
        let current = items.to_vec(None);
        items.replace(vec![current[2].clone(), current[0].clone(), current[1].clone()]);
        runtime.run_until_idle(16);

        let after = handler.rows();
        assert!(after[0].ptr_eq(&before[2]));
        assert!(after[1].ptr_eq(&before[0]));
        assert!(after[2].ptr_eq(&before[1]));
        assert!(after.iter().all(|row| !row.is_destroyed()));
        assert_eq!(
            handler.keys(),
            vec![
                RowKey::Number(3f64.to_bits()),
                RowKey::Number(1f64.to_bits()),
                RowKey::Number(2f64.to_bits()),
            ]
        );
        insta::assert_snapshot!(
            view.html(),
            @"<ul><li><!---->c<!----></li><li><!---->a<!----></li><li><!---->b<!----></li><!----></ul>"
        );
    }

    #[test]
    fn keyed_refresh_updates_in_place() {
        let runtime = runtime();
        let data = data(json!({ "items": [{ "id": "x", "v": 1 }] }));
        let view = rendered(
            &runtime,
            r#"<ul><li _each="item of items" _key="item.id">{{ item.v }}</li></ul>"#,
            &data,
        );
        let before = each(&view).rows();

        data.set("items", Value::from_json(&json!([{ "id": "x", "v": 2 }])));
        runtime.run_until_idle(16);

        let after = each(&view).rows();
        assert!(after[0].ptr_eq(&before[0]));
        assert_eq!(view.html(), "<ul><li><!---->2<!----></li><!----></ul>");
    }

    #[test]
    fn keyed_removal_destroys_the_row_and_forgets_its_key() {
        let runtime = runtime();
        let data = data(json!({
            "items": [
                { "id": 1, "v": "a" },
                { "id": 2, "v": "b" },
                { "id": 3, "v": "c" }
            ]
        }));
        let view = rendered(
            &runtime,
            r#"<ul><li _each="item of items" _key="item.id">{{ item.v }}</li></ul>"#,
            &data,
        );
        let handler = each(&view);
        let before = handler.rows();
        let items = array(&data, "items");
        let removed = items.to_vec(None)[1].clone();

        items.splice(1, 1, Vec::new());
        runtime.run_until_idle(16);

        let after = handler.rows();
        assert_eq!(after.len(), 2);
        assert!(before[1].is_destroyed());
        assert!(after[0].ptr_eq(&before[0]));
        assert!(after[1].ptr_eq(&before[2]));
        assert_eq!(
            handler.keys(),
            vec![RowKey::Number(1f64.to_bits()), RowKey::Number(3f64.to_bits())]
        );
        assert_eq!(view.html(), "<ul><li><!---->a<!----></li><li><!---->c<!----></li><!----></ul>");

        // The key is free again: bringing the item back builds a new row.
        items.splice(1, 0, vec![removed]);
        runtime.run_until_idle(16);

        let restored = handler.rows();
        assert_eq!(restored.len(), 3);
        assert!(!restored[1].ptr_eq(&before[1]));
        assert!(!restored[1].is_destroyed());
        assert_eq!(
            view.html(),
            "<ul><li><!---->a<!----></li><li><!---->b<!----></li><li><!---->c<!----></li><!----></ul>"
        );
    }

    #[test]
    fn duplicate_keys_render_without_reuse() {
        let runtime = runtime();
        let data = data(json!({ "items": [{ "id": 1, "v": "a" }, { "id": 1, "v": "b" }] }));
        let view = rendered(
            &runtime,
            r#"<ul><li _each="item of items" _key="item.id">{{ item.v }}</li></ul>"#,
            &data,
        );
        let handler = each(&view);
        assert_eq!(view.html(), "<ul><li><!---->a<!----></li><li><!---->b<!----></li><!----></ul>");
        assert_eq!(handler.keys(), vec![RowKey::Number(1f64.to_bits())]);
        let before = handler.rows();

        array(&data, "items").push(Value::from_json(&json!({ "id": 2, "v": "c" })));
        runtime.run_until_idle(16);

        let after = handler.rows();
        assert!(after[0].ptr_eq(&before[0]));
        assert!(!after[1].ptr_eq(&before[1]));
        assert!(before[1].is_destroyed());
        assert_eq!(
            view.html(),
            "<ul><li><!---->a<!----></li><li><!---->b<!----></li><li><!---->c<!----></li><!----></ul>"
        );
    }

    #[test]
    fn falsy_keys_render_without_reuse() {
        let runtime = runtime();
        let data = data(json!({ "items": [{ "id": 0, "v": "zero" }, { "id": 1, "v": "one" }] }));
        let view = rendered(
            &runtime,
            r#"<ul><li _each="item of items" _key="item.id">{{ item.v }}</li></ul>"#,
            &data,
        );
        let handler = each(&view);
        assert!(handler.is_keyed());
        assert_eq!(handler.keys(), vec![RowKey::Number(1f64.to_bits())]);
        let before = handler.rows();

        array(&data, "items").reverse();
        runtime.run_until_idle(16);

        let after = handler.rows();
        assert!(after[0].ptr_eq(&before[1]));
        assert!(before[0].is_destroyed());
        assert!(!after[1].is_destroyed());
        assert_eq!(view.html(), "<ul><li><!---->one<!----></li><li><!---->zero<!----></li><!----></ul>");
    }

    #[test]
    fn unkeyed_shrink_destroys_exactly_one_row() {
        let runtime = runtime();
        let data = data(json!({ "nums": [1, 2, 3] }));
        let view = rendered(&runtime, r#"<ul><li _each="n of nums">{{ n }}</li></ul>"#, &data);
        let before = each(&view).rows();

        array(&data, "nums").pop();
        runtime.run_until_idle(16);

        let after = each(&view).rows();
        assert_eq!(after.len(), 2);
        assert!(after[0].ptr_eq(&before[0]));
        assert!(after[1].ptr_eq(&before[1]));
        let destroyed: Vec<bool> = before.iter().map(View::is_destroyed).collect();
        assert_eq!(destroyed, vec![false, false, true]);
        assert_eq!(view.html(), "<ul><li><!---->1<!----></li><li><!---->2<!----></li><!----></ul>");
    }

    #[test]
    fn unkeyed_rows_refresh_by_position() {
        let runtime = runtime();
        let data = data(json!({ "nums": [1, 2] }));
        let view = rendered(&runtime, r#"<ul><li _each="n of nums">{{ n }}</li></ul>"#, &data);

        array(&data, "nums").reverse();
        runtime.run_until_idle(16);
        assert_eq!(view.html(), "<ul><li><!---->2<!----></li><li><!---->1<!----></li><!----></ul>");
    }

    #[test]
    fn emptied_sole_child_loop_leaves_only_the_placeholder() {
        let runtime = runtime();
        let data = data(json!({ "items": ["a", "b"] }));
        let view = rendered(&runtime, "<ul>\n  <li _each=\"item of items\">{{ item }}</li>\n</ul>", &data);
        let rows = each(&view).rows();

        array(&data, "items").clear();
        runtime.flush();
        assert_eq!(view.html(), "<ul><!----></ul>");
        assert_eq!(each(&view).phase(), LoopPhase::Empty);

        runtime.run_until_idle(16);
        assert!(rows.iter().all(View::is_destroyed));
    }

    #[test]
    fn emptied_loop_with_siblings_keeps_them() {
        let runtime = runtime();
        let data = data(json!({ "xs": [1, 2] }));
        let view = rendered(&runtime, r#"<div><h1>T</h1><p _each="x of xs">{{ x }}</p></div>"#, &data);
        let rows = each(&view).rows();

        data.set("xs", Value::from(Vec::<Value>::new()));
        runtime.flush();
        assert_eq!(view.html(), "<div><h1>T</h1><!----></div>");
        assert_eq!(each(&view).row_count(), 0);
        assert!(rows.iter().all(View::is_destroyed));
    }

    #[test]
    fn emptied_nested_loop_keeps_outer_content() {
        let runtime = runtime();
        let data = data(json!({ "groups": [[1, 2], [3]] }));
        let view = rendered(
            &runtime,
            r#"<div><h1>T</h1><template _each="g of groups"><b _each="x of g">{{ x }}</b></template></div>"#,
            &data,
        );
        insta::assert_snapshot!(
            view.html(),
            @"<div><h1>T</h1><b><!---->1<!----></b><b><!---->2<!----></b><!----><b><!---->3<!----></b><!----><!----></div>"
        );
        let groups = each(&view).rows();
        let inner = groups[0].find_handler::<EachHandler>().expect("row has a loop");
        let inner_rows = inner.rows();

        array(&data, "groups").to_vec(None)[0]
            .as_array()
            .cloned()
            .expect("group is an array")
            .clear();
        runtime.run_until_idle(16);

        insta::assert_snapshot!(
            view.html(),
            @"<div><h1>T</h1><!----><b><!---->3<!----></b><!----><!----></div>"
        );
        assert_eq!(inner.phase(), LoopPhase::Empty);
        assert!(inner_rows.iter().all(View::is_destroyed));
        assert_eq!(each(&view).row_count(), 2);
        assert!(groups.iter().all(|row| !row.is_destroyed()));
    }

    #[test]
    fn non_collection_source_renders_nothing() {
        let runtime = runtime();
        let data = data(json!({ "xs": [1] }));
        let view = rendered(&runtime, r#"<div><p _each="x of xs">{{ x }}</p></div>"#, &data);

        let rows = each(&view).rows();
        data.set("xs", Value::Null);
        runtime.run_until_idle(16);
        assert_eq!(view.html(), "<div><!----></div>");
        assert_eq!(each(&view).phase(), LoopPhase::Empty);
        assert!(rows.iter().all(View::is_destroyed));

        data.set("xs", Value::from_json(&json!([7])));
        runtime.run_until_idle(16);
        assert_eq!(view.html(), "<div><p><!---->7<!----></p><!----></div>");
    }
}

// =============================================================================
// Teardown
// =============================================================================

mod teardown {
    use super::*;

    #[test]
    fn destroy_detaches_rows_and_is_idempotent() {
        let runtime = runtime();
        let data = data(json!({ "items": [1, 2] }));
        let view = rendered(&runtime, r#"<ul><li _each="item of items">{{ item }}</li></ul>"#, &data);
        let handler = each(&view);
        let rows = handler.rows();

        handler.destroy();
        handler.destroy();
        assert_eq!(handler.phase(), LoopPhase::Destroyed);
        assert!(rows.iter().all(View::is_destroyed));
        assert_eq!(view.html(), "<ul><!----></ul>");

        array(&data, "items").push(Value::from(3));
        data.set("items", Value::Null);
        runtime.run_until_idle(16);
        assert_eq!(view.html(), "<ul><!----></ul>");
        assert_eq!(runtime.scheduler().pending(), 0);
    }

    #[test]
    fn pending_iteration_after_destroy_is_a_no_op() {
        let runtime = runtime();
        let data = data(json!({ "items": [1] }));
        let view = rendered(&runtime, r#"<ul><li _each="item of items">{{ item }}</li></ul>"#, &data);

        array(&data, "items").push(Value::from(2));
        assert_eq!(runtime.scheduler().pending(), 1);
        view.destroy();
        runtime.run_until_idle(16);

        assert_eq!(each(&view).row_count(), 0);
        assert_eq!(view.html(), "<ul><!----></ul>");
    }
}
