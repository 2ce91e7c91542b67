//! Storefront Example - a small interactive shop in the terminal
//!
//! Demonstrates:
//! - Keyed lists that reorder without recreating rows
//! - A memoized product row
//! - Mouse clicks and keyboard input routed into the document
//!
//! Controls: click "Add" to put an item in the cart, click "Sort" to flip the
//! order, click the search box and type to filter. Ctrl+C exits.
//!
//! Run with: cargo run --example storefront

use spark_dom::{
    attach, create_element, memo, style, use_memo, use_state, Component, Document, Element,
    EventDetail, MountConfig, Props,
};
use spark_dom::{deps, nodes};

const PRODUCTS: &[(&str, &str, i64)] = &[
    ("tea", "Green tea", 4),
    ("mug", "Enamel mug", 12),
    ("kettle", "Kettle", 35),
    ("spoon", "Spoon", 2),
];

fn product_row(props: &Props) -> Element {
    let name = props.get_str("name").unwrap_or_default().to_string();
    let price = props.get_int("price").unwrap_or_default();
    create_element(
        "div",
        Props::new().with("style", style([("flex-direction", "row"), ("gap", "2")])),
        nodes![
            create_element("span", Props::new().with("style", style([("width", "14")])), name),
            create_element("span", Props::new().with("style", style([("color", "yellow")])), format!("${price}")),
        ],
    )
}

fn button(label: &str, props: Props) -> Element {
    create_element(
        "button",
        props.with(
            "style",
            style([("border", "single"), ("padding", "0 1"), ("margin", "0 1 0 0")]),
        ),
        label,
    )
}

fn storefront(_: &Props) -> Element {
    let (cart, set_cart) = use_state(0i64);
    let (descending, set_descending) = use_state(false);
    let (query, set_query) = use_state(String::new());
    let row = use_memo(|| memo(product_row), deps![]);

    let mut products: Vec<_> = PRODUCTS
        .iter()
        .filter(|(_, name, _)| name.to_lowercase().contains(&query.to_lowercase()))
        .collect();
    products.sort_by_key(|(_, _, price)| *price);
    if descending {
        products.reverse();
    }
    let rows: Vec<Element> = products
        .into_iter()
        .map(|(id, name, price)| {
            create_element(
                row.clone(),
                Props::new().with("key", *id).with("name", *name).with("price", *price),
                (),
            )
        })
        .collect();

    let typing = set_query.clone();
    create_element(
        "div",
        Props::new().with("style", style([("padding", "1"), ("gap", "1")])),
        nodes![
            create_element(
                "h1",
                Props::new().with("style", style([("font-weight", "bold"), ("color", "cyan")])),
                format!("Spark Store  ·  cart: {cart}"),
            ),
            create_element(
                "div",
                Props::new().with("style", style([("flex-direction", "row")])),
                nodes![
                    button("Add", Props::new().on("click", move |_| set_cart.update(|n| n + 1))),
                    button(
                        "Sort",
                        Props::new().on("click", move |_| set_descending.update(|d| !d)),
                    ),
                    button("Clear", Props::new().on("click", move |_| set_query.set(String::new()))),
                ],
            ),
            create_element(
                "input",
                Props::new()
                    .with("style", style([("border", "single"), ("width", "30")]))
                    .on("keydown", move |event| match event.detail() {
                        EventDetail::Key { key, .. } if key == "Backspace" => {
                            typing.update(|q| {
                                let mut q = q.clone();
                                q.pop();
                                q
                            });
                        }
                        EventDetail::Key { key, .. } if key.chars().count() == 1 => {
                            typing.update(|q| format!("{q}{key}"));
                        }
                        _ => {}
                    }),
                if query.is_empty() { "search…".to_string() } else { query.clone() },
            ),
            create_element("div", Props::new(), rows),
        ],
    )
}

fn main() -> spark_dom::Result<()> {
    env_logger::init();

    let document = Document::new();
    let container = document.create_element("main");
    let root = attach(&document, container)?;

    let mut handle = spark_dom::mount(
        &root,
        create_element(Component::new(storefront), Props::new(), ()),
        MountConfig::default(),
    )?;
    handle.run()?;
    handle.unmount()
}
