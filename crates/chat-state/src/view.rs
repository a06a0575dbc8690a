//! View state for the directory dropdown
//!
//! The dropdown closes when a counterpart is picked or when a pointer press
//! lands outside its bounds. The presentation layer reports the bounds after
//! layout and forwards every pointer press.

/// A point in presentation coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Horizontal position
    pub x: f32,
    /// Vertical position
    pub y: f32,
}

impl Point {
    /// Create a point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl Bounds {
    /// Create bounds from origin and size
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Whether `point` lies inside, edges included
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

/// Open/closed state of the directory dropdown
#[derive(Debug, Clone, Default)]
pub struct DirectoryMenu {
    open: bool,
    bounds: Option<Bounds>,
}

impl DirectoryMenu {
    /// Create a closed menu
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the menu is open
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Open the menu
    pub fn open(&mut self) {
        self.open = true;
    }

    /// Close the menu; returns whether it was open
    pub fn close(&mut self) -> bool {
        std::mem::replace(&mut self.open, false)
    }

    /// Flip the menu state and return the new state
    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    /// Record where the menu (button and overlay) is drawn
    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = Some(bounds);
    }

    /// Handle a pointer press; closes the menu if it landed outside
    ///
    /// A press while no bounds are known counts as outside. Returns whether
    /// the menu was closed.
    pub fn pointer_down(&mut self, at: Point) -> bool {
        if !self.open {
            return false;
        }
        let inside = self.bounds.is_some_and(|b| b.contains(at));
        if inside {
            false
        } else {
            self.close()
        }
    }
}
