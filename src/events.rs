//! Interaction event mapping.
//!
//! Translates the surface's five raw tap/drag events into four semantic
//! actions. Pure translation: no graph mutation, and no state beyond what
//! is needed to attribute a `tap-end` to the element the drag started on.

use crate::model::ElementRef;
use crate::surface::SurfaceEvent;

/// Semantic interaction actions consumed by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionAction {
    /// A tap completed; `None` means empty background.
    ElementTapped(Option<ElementRef>),
    /// A drag began on an element.
    DragStarted(ElementRef),
    /// The pointer moved during a drag.
    DragMoved(ElementRef),
    /// A drag ended. `exited` is true when the pointer left the element
    /// (`tap-drag-out`) rather than being released over it (`tap-end`).
    DragEnded { element: ElementRef, exited: bool },
}

/// Maps raw surface events to semantic actions.
#[derive(Debug, Default)]
pub struct InteractionMapper {
    drag_target: Option<ElementRef>,
}

impl InteractionMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translates one raw event. Layout lifecycle events and pointer
    /// activity on empty background translate to nothing.
    pub fn map(&mut self, event: &SurfaceEvent) -> Option<InteractionAction> {
        match event {
            SurfaceEvent::Tap { target } => {
                Some(InteractionAction::ElementTapped(target.clone()))
            }
            SurfaceEvent::TapStart { target: Some(element) } => {
                self.drag_target = Some(element.clone());
                Some(InteractionAction::DragStarted(element.clone()))
            }
            SurfaceEvent::TapStart { target: None } => {
                self.drag_target = None;
                None
            }
            SurfaceEvent::TapDrag { target } => target
                .clone()
                .or_else(|| self.drag_target.clone())
                .map(InteractionAction::DragMoved),
            SurfaceEvent::TapDragOut { target } => {
                self.drag_target = None;
                Some(InteractionAction::DragEnded {
                    element: target.clone(),
                    exited: true,
                })
            }
            SurfaceEvent::TapEnd { target } => {
                let element = self.drag_target.take().or_else(|| target.clone())?;
                Some(InteractionAction::DragEnded {
                    element,
                    exited: false,
                })
            }
            SurfaceEvent::LayoutStart { .. } | SurfaceEvent::LayoutStop { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> ElementRef {
        ElementRef::Node(id.into())
    }

    #[test]
    fn background_tap_maps_to_none_target() {
        let mut mapper = InteractionMapper::new();
        assert_eq!(
            mapper.map(&SurfaceEvent::Tap { target: None }),
            Some(InteractionAction::ElementTapped(None))
        );
    }

    #[test]
    fn element_tap_maps_to_that_element() {
        let mut mapper = InteractionMapper::new();
        assert_eq!(
            mapper.map(&SurfaceEvent::Tap { target: Some(node("a")) }),
            Some(InteractionAction::ElementTapped(Some(node("a"))))
        );
    }

    #[test]
    fn drag_sequence_on_element() {
        let mut mapper = InteractionMapper::new();
        assert_eq!(
            mapper.map(&SurfaceEvent::TapStart { target: Some(node("a")) }),
            Some(InteractionAction::DragStarted(node("a")))
        );
        assert_eq!(
            mapper.map(&SurfaceEvent::TapDrag { target: None }),
            Some(InteractionAction::DragMoved(node("a")))
        );
        assert_eq!(
            mapper.map(&SurfaceEvent::TapEnd { target: None }),
            Some(InteractionAction::DragEnded {
                element: node("a"),
                exited: false
            })
        );
        // Drag finished; a stray tap-end translates to nothing.
        assert_eq!(mapper.map(&SurfaceEvent::TapEnd { target: None }), None);
    }

    #[test]
    fn drag_out_reports_exit() {
        let mut mapper = InteractionMapper::new();
        mapper.map(&SurfaceEvent::TapStart { target: Some(node("a")) });
        assert_eq!(
            mapper.map(&SurfaceEvent::TapDragOut { target: node("a") }),
            Some(InteractionAction::DragEnded {
                element: node("a"),
                exited: true
            })
        );
    }

    #[test]
    fn background_press_starts_no_drag() {
        let mut mapper = InteractionMapper::new();
        assert_eq!(mapper.map(&SurfaceEvent::TapStart { target: None }), None);
        assert_eq!(mapper.map(&SurfaceEvent::TapDrag { target: None }), None);
    }
}
