//! Counter Example - state, effects and delegated clicks without a terminal
//!
//! Renders a counter into a document, clicks it a few times by dispatching
//! native events, and prints the markup after each flush.
//!
//! Run with: RUST_LOG=debug cargo run --example counter

use spark_dom::{
    attach, cleanup, create_element, deps, use_effect, use_state, Component, Document,
    NativeEvent, Props,
};

fn counter(props: &Props) -> spark_dom::Element {
    let step = props.get_int("step").unwrap_or(1);
    let (count, set_count) = use_state(0i64);

    use_effect(
        move || {
            log::info!("count is now {count}");
            cleanup(move || log::debug!("leaving {count}"))
        },
        deps![count],
    );

    create_element(
        "button",
        Props::new()
            .with("id", "counter")
            .on("click", move |_| set_count.update(|n| n + step)),
        format!("Clicked {count} times"),
    )
}

fn main() -> spark_dom::Result<()> {
    env_logger::init();

    let document = Document::new();
    let container = document.create_element("main");
    let root = attach(&document, container)?;
    root.render(create_element(
        Component::new(counter),
        Props::new().with("step", 2),
        (),
    ))?;
    println!("{}", document.to_markup(container));

    let Some(button) = document.find_by_attribute(container, "id", "counter") else {
        return Ok(());
    };
    for _ in 0..3 {
        document.dispatch_event(button, &NativeEvent::new("click"));
        root.flush()?;
        println!("{}", document.to_markup(container));
    }

    root.unmount();
    Ok(())
}
