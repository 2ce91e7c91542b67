//! Memoized components.

use crate::primitives::element::{fn_address, short_type_name};
use crate::primitives::{Component, Element};
use crate::state::use_ref;
use crate::types::Props;

/// Wrap a render function so it reuses its previous output while its props
/// stay shallowly equal.
pub fn memo<F, R>(render: F) -> Component
where
    F: Fn(&Props) -> R + 'static,
    R: Into<Option<Element>> + 'static,
{
    memo_with(render, |previous: &Props, next: &Props| previous == next)
}

/// [`memo`] with a custom props comparison.
///
/// Hooks called by `render` belong to the memoized component; they are
/// skipped along with `render` when the output is reused.
pub fn memo_with<F, R, E>(render: F, equals: E) -> Component
where
    F: Fn(&Props) -> R + 'static,
    R: Into<Option<Element>> + 'static,
    E: Fn(&Props, &Props) -> bool + 'static,
{
    let name = format!("Memo({})", short_type_name::<F>());
    let address = fn_address(&render);
    Component::new(move |props: &Props| -> Option<Element> {
        let cache = use_ref(None::<(Props, Option<Element>)>);
        let reused = cache
            .borrow()
            .as_ref()
            .filter(|(previous, _)| equals(previous, props))
            .map(|(_, output)| output.clone());
        if let Some(output) = reused {
            return output;
        }
        let output: Option<Element> = render(props).into();
        cache.set(Some((props.clone(), output.clone())));
        output
    })
    .named(name)
    .with_address(address)
}
