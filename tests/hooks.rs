//! Hooks driven through a real root: batching, effects, memoization.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use spark_dom::{
    attach, cleanup, create_element, deps, memo, use_auto_callback, use_effect, use_state,
    Component, Document, Element, EventHandler, NativeEvent, NodeId, Props, Root, SetState,
};

fn mount(element: Element) -> (Document, NodeId, Root) {
    let doc = Document::new();
    let container = doc.create_element("main");
    let root = attach(&doc, container).unwrap();
    root.render(element).unwrap();
    (doc, container, root)
}

fn click(doc: &Document, root: &Root, node: NodeId) {
    doc.dispatch_event(node, &NativeEvent::new("click"));
    root.flush().unwrap();
}

#[test]
fn test_updates_in_one_handler_render_once() {
    let counter = Component::new(|_: &Props| {
        let (count, set_count) = use_state(0i64);
        create_element(
            "button",
            Props::new().on("click", move |_| {
                set_count.update(|n| n + 1);
                set_count.update(|n| n + 1);
                set_count.update(|n| n + 1);
            }),
            count,
        )
    });
    let (doc, container, root) = mount(create_element(counter, Props::new(), ()));
    let button = doc.first_child(container).unwrap();
    let renders = root.engine().render_count();

    click(&doc, &root, button);
    assert_eq!(doc.text_content(container), "3");
    assert_eq!(root.engine().render_count(), renders + 1);
}

#[test]
fn test_setting_same_value_skips_render() {
    let sink: Rc<RefCell<Option<SetState<i64>>>> = Rc::default();
    let captured = sink.clone();
    let app = Component::new(move |_: &Props| {
        let (value, set_value) = use_state(7i64);
        *captured.borrow_mut() = Some(set_value);
        create_element("p", Props::new(), value)
    });
    let (_doc, _container, root) = mount(create_element(app, Props::new(), ()));
    let renders = root.engine().render_count();

    let setter = sink.borrow().clone().unwrap();
    setter.set(7);
    assert!(!root.engine().is_render_pending());
    root.flush().unwrap();
    assert_eq!(root.engine().render_count(), renders);
}

#[test]
fn test_effect_cleanup_runs_on_removal() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let child_log = log.clone();
    let child = Component::new(move |_: &Props| {
        let log = child_log.clone();
        use_effect(
            move || {
                log.borrow_mut().push("mount");
                cleanup(move || log.borrow_mut().push("cleanup"))
            },
            deps![],
        );
        create_element("span", Props::new(), "child")
    });

    let parent = Component::new(move |_: &Props| {
        let (shown, set_shown) = use_state(true);
        let body = shown.then(|| create_element(child.clone(), Props::new(), ()));
        create_element(
            "div",
            Props::new().on("click", move |_| set_shown.set(false)),
            body,
        )
    });

    let (doc, container, root) = mount(create_element(parent, Props::new(), ()));
    assert_eq!(*log.borrow(), vec!["mount"]);

    let div = doc.first_child(container).unwrap();
    click(&doc, &root, div);
    assert_eq!(*log.borrow(), vec!["mount", "cleanup"]);
    assert_eq!(doc.to_markup(container), "<main><div></div></main>");
}

#[test]
fn test_effect_skipped_while_deps_unchanged() {
    let runs = Rc::new(Cell::new(0));
    let effect_runs = runs.clone();
    let app = Component::new(move |_: &Props| {
        let (count, set_count) = use_state(0i64);
        let label = if count < 2 { "low" } else { "high" };
        let runs = effect_runs.clone();
        use_effect(move || runs.set(runs.get() + 1), deps![label]);
        create_element(
            "button",
            Props::new().on("click", move |_| set_count.update(|n| n + 1)),
            label,
        )
    });
    let (doc, container, root) = mount(create_element(app, Props::new(), ()));
    let button = doc.first_child(container).unwrap();
    assert_eq!(runs.get(), 1);

    click(&doc, &root, button);
    assert_eq!(runs.get(), 1);
    click(&doc, &root, button);
    assert_eq!(runs.get(), 2);
    assert_eq!(doc.text_content(container), "high");
}

#[test]
fn test_memo_skips_render_for_equal_props() {
    let badge_renders = Rc::new(Cell::new(0));
    let renders = badge_renders.clone();
    let badge = memo(move |props: &Props| {
        renders.set(renders.get() + 1);
        create_element(
            "span",
            Props::new(),
            props.get_str("label").unwrap_or_default().to_string(),
        )
    });

    let app = Component::new(move |_: &Props| {
        let (count, set_count) = use_state(0i64);
        create_element(
            "div",
            Props::new().on("click", move |_| set_count.update(|n| n + 1)),
            spark_dom::nodes![
                create_element(badge.clone(), Props::new().with("label", "sale"), ()),
                count,
            ],
        )
    });

    let (doc, container, root) = mount(create_element(app, Props::new(), ()));
    let div = doc.first_child(container).unwrap();
    click(&doc, &root, div);
    click(&doc, &root, div);

    assert_eq!(badge_renders.get(), 1);
    assert_eq!(doc.text_content(container), "sale2");
}

#[test]
fn test_auto_callback_keeps_identity_and_sees_latest_state() {
    let handlers: Rc<RefCell<Vec<EventHandler>>> = Rc::default();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let (sink, seen_sink) = (handlers.clone(), seen.clone());
    let app = Component::new(move |_: &Props| {
        let (count, set_count) = use_state(0i64);
        let seen = seen_sink.clone();
        let handler = use_auto_callback(move |_| {
            seen.borrow_mut().push(count);
            set_count.set(count + 1);
        });
        sink.borrow_mut().push(handler.clone());
        create_element("button", Props::new().with_handler("click", handler), count)
    });

    let (doc, container, root) = mount(create_element(app, Props::new(), ()));
    let button = doc.first_child(container).unwrap();
    click(&doc, &root, button);
    click(&doc, &root, button);

    assert_eq!(*seen.borrow(), vec![0, 1]);
    let handlers = handlers.borrow();
    assert_eq!(handlers.len(), 3);
    assert!(handlers.iter().all(|h| Rc::ptr_eq(h, &handlers[0])));
}
