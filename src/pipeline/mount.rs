//! Mount API - run a render root on the terminal.
//!
//! The loop is: poll input, route it into the document, flush queued renders
//! and effects, and repaint when the document changed or the terminal was
//! resized.
//!
//! # Example
//!
//! ```ignore
//! use spark_dom::{attach, create_element, Component, Document, MountConfig, Props};
//! use spark_dom::pipeline::mount;
//!
//! let document = Document::new();
//! let container = document.create_element("main");
//! let root = attach(&document, container)?;
//!
//! let mut handle = mount(&root, create_element(Component::new(app), Props::new(), ()), MountConfig::default())?;
//! handle.run()?;      // Blocks until Ctrl+C or a StopHandle fires
//! handle.unmount()?;
//! ```

use std::io::{self, Stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossterm::terminal;

use super::root::Root;
use crate::config::MountConfig;
use crate::error::Result;
use crate::layout::compute_layout;
use crate::primitives::Element;
use crate::renderer::{paint, DiffRenderer, Frame};
use crate::state::input::{self, InputEvent, InputRouter};

// =============================================================================
// Stop handle
// =============================================================================

/// Requests the loop to stop; cheap to clone into event handlers.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Terminal handle
// =============================================================================

/// A root presented on a terminal surface.
pub struct TerminalHandle<W: Write = Stdout> {
    root: Root,
    config: MountConfig,
    renderer: DiffRenderer<W>,
    router: InputRouter,
    frame: Option<Frame>,
    size: (u16, u16),
    presented: Option<(u64, (u16, u16))>,
    running: StopHandle,
    /// Whether raw mode and the alternate screen are ours to restore.
    owns_terminal: bool,
}

/// Render `element` into `root` and take over the terminal.
pub fn mount(root: &Root, element: Element, config: MountConfig) -> Result<TerminalHandle> {
    root.render(element)?;
    let size = terminal::size()?;
    terminal::enable_raw_mode()?;
    let mut renderer = DiffRenderer::new(io::stdout());
    if let Err(err) = renderer.enter_fullscreen(config.mouse_capture) {
        let _ = terminal::disable_raw_mode();
        return Err(err.into());
    }
    log::debug!("mounted {:?} on a {}x{} terminal", root.container(), size.0, size.1);

    let mut handle = TerminalHandle::with_renderer(root.clone(), renderer, size, config);
    handle.owns_terminal = true;
    handle.present()?;
    Ok(handle)
}

impl<W: Write> TerminalHandle<W> {
    /// A handle writing to `out` with a fixed size, leaving the terminal
    /// modes alone. `root` should already have something rendered.
    pub fn headless(root: Root, out: W, width: u16, height: u16, config: MountConfig) -> Self {
        Self::with_renderer(root, DiffRenderer::new(out), (width, height), config)
    }

    fn with_renderer(
        root: Root,
        renderer: DiffRenderer<W>,
        size: (u16, u16),
        config: MountConfig,
    ) -> Self {
        Self {
            root,
            config,
            renderer,
            router: InputRouter::default(),
            frame: None,
            size,
            presented: None,
            running: StopHandle(Arc::new(AtomicBool::new(true))),
            owns_terminal: false,
        }
    }

    pub fn root(&self) -> &Root {
        &self.root
    }

    /// Last painted frame.
    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    pub fn router(&self) -> &InputRouter {
        &self.router
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.running.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.is_running()
    }

    pub fn stop(&self) {
        self.running.stop();
    }

    /// Process one input event, then flush and repaint.
    pub fn handle_event(&mut self, event: &InputEvent) -> Result<()> {
        match event {
            InputEvent::Resize(width, height) => {
                log::debug!("terminal resized to {width}x{height}");
                self.size = (*width, *height);
                self.renderer.invalidate();
            }
            InputEvent::Key(key) if key.is_interrupt() && self.config.exit_on_ctrl_c => {
                log::debug!("ctrl+c: stopping");
                self.stop();
                return Ok(());
            }
            _ => {
                if let Some(frame) = &self.frame {
                    let document = self.root.document();
                    self.router
                        .route(document, self.root.container(), &frame.hits, event);
                }
            }
        }
        self.root.flush()?;
        self.present()?;
        Ok(())
    }

    /// Wait up to the configured tick for input and process it.
    ///
    /// Returns `Ok(false)` once the loop should stop.
    pub fn tick(&mut self) -> Result<bool> {
        if !self.is_running() {
            return Ok(false);
        }
        match input::poll_event(self.config.tick)? {
            Some(event) => self.handle_event(&event)?,
            None => {
                self.root.flush()?;
                self.present()?;
            }
        }
        Ok(self.is_running())
    }

    /// Tick until stopped.
    pub fn run(&mut self) -> Result<()> {
        while self.tick()? {}
        Ok(())
    }

    /// Repaint if the document or the size changed since the last frame.
    pub fn present(&mut self) -> Result<bool> {
        let document = self.root.document();
        let state = (document.mutation_count(), self.size);
        if self.presented == Some(state) {
            return Ok(false);
        }
        let (width, height) = self.size;
        let layout = compute_layout(document, self.root.container(), width, height);
        let frame = paint(document, self.root.container(), &layout);
        self.renderer.render(&frame.buffer)?;
        log::trace!("presented {} laid-out nodes", layout.len());
        self.frame = Some(frame);
        self.presented = Some(state);
        Ok(true)
    }

    /// Restore the terminal and unmount the root.
    pub fn unmount(mut self) -> Result<()> {
        self.stop();
        self.restore()?;
        self.root.clone().unmount();
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        if !self.owns_terminal {
            return Ok(());
        }
        self.owns_terminal = false;
        self.renderer.exit_fullscreen(self.config.mouse_capture)?;
        terminal::disable_raw_mode()
    }
}

impl<W: Write> Drop for TerminalHandle<W> {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            log::warn!("failed to restore terminal: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, Modifiers, MouseButton};
    use crate::pipeline::root::attach;
    use crate::primitives::create_element;
    use crate::state::input::KeyEvent;
    use crate::state::mouse::MouseEvent;
    use crate::types::Props;

    fn headless(element: Element) -> TerminalHandle<Vec<u8>> {
        let doc = Document::new();
        let container = doc.create_element("main");
        let root = attach(&doc, container).unwrap();
        root.render(element).unwrap();
        TerminalHandle::headless(root, Vec::new(), 12, 3, MountConfig::default())
    }

    #[test]
    fn test_present_only_on_change() {
        let mut handle = headless(create_element("p", Props::new(), "hello"));
        assert!(handle.present().unwrap());
        assert!(!handle.present().unwrap());
        let frame = handle.frame().unwrap();
        assert_eq!(frame.buffer.row_text(0), "hello       ");

        assert!(matches!(handle.handle_event(&InputEvent::Resize(8, 2)), Ok(())));
        assert_eq!(handle.frame().unwrap().buffer.width(), 8);
        assert_eq!(handle.frame().unwrap().buffer.row_text(0), "hello   ");
    }

    #[test]
    fn test_ctrl_c_stops() {
        let mut handle = headless(create_element("p", Props::new(), "x"));
        let key = KeyEvent::press("c").with_modifiers(Modifiers::ctrl());
        handle.handle_event(&InputEvent::Key(key)).unwrap();
        assert!(!handle.is_running());
        assert!(!handle.tick().unwrap());
    }

    #[test]
    fn test_click_routes_to_element() {
        let clicks = std::rc::Rc::new(std::cell::Cell::new(0));
        let counter = clicks.clone();
        let button = create_element(
            "button",
            Props::new().on("click", move |_| counter.set(counter.get() + 1)),
            "Buy",
        );
        let mut handle = headless(button);
        handle.present().unwrap();
        for event in [
            MouseEvent::down(MouseButton::Left, 1, 0),
            MouseEvent::up(MouseButton::Left, 1, 0),
        ] {
            handle.handle_event(&InputEvent::Mouse(event)).unwrap();
        }
        assert_eq!(clicks.get(), 1);
    }
}
