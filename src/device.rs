use log::debug;

use crate::color::{Color, Rgb};
use crate::controls::{
    BackBufferOperation, Brightness, BufferId, Button, Cell, Control, Pad, ScrollSpeed, GRID_SIZE,
};
use crate::error::ProtocolError;
use crate::protocol::Event;

/// One illumination grid. Unset cells render as [`Color::OFF`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Buffer {
    cells: [[Option<Color>; GRID_SIZE]; GRID_SIZE],
}

impl Buffer {
    pub fn get(&self, control: Control) -> Option<Color> {
        self.cell(control.cell())
    }

    fn cell(&self, cell: Cell) -> Option<Color> {
        self.cells[cell.column][cell.row]
    }

    fn set(&mut self, cell: Cell, color: Color) {
        self.cells[cell.column][cell.row] = Some(color);
    }

    fn fill(&mut self, color: Color) {
        for column in self.cells.iter_mut() {
            column.fill(Some(color));
        }
    }
}

/// Resolved appearance of one control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayColor {
    pub rgb: Rgb,
    pub opacity: f32,
}

/// Callback receiving user interactions.
pub type Listener = Box<dyn FnMut(Event) + 'static>;

/// Double-buffered light state of one emulated device.
pub struct DeviceState {
    buffers: [Buffer; 2],
    visible: BufferId,
    write: BufferId,
    level: Brightness,
    listener: Option<Listener>,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceState {
    pub fn new() -> Self {
        Self {
            buffers: [Buffer::default(); 2],
            visible: BufferId::Buffer0,
            write: BufferId::Buffer0,
            level: Brightness::default(),
            listener: None,
        }
    }

    /// Clear both buffers. Buffer selection and brightness are kept.
    pub fn reset(&mut self) {
        self.buffers = [Buffer::default(); 2];
    }

    pub fn set_pad_light(&mut self, pad: Pad, color: Color, operation: BackBufferOperation) {
        self.set_light(Control::Pad(pad).cell(), color, operation);
    }

    pub fn set_button_light(&mut self, button: Button, color: Color, operation: BackBufferOperation) {
        self.set_light(Control::Button(button).cell(), color, operation);
    }

    fn set_light(&mut self, cell: Cell, color: Color, operation: BackBufferOperation) {
        let back = self.back_buffer().index();
        self.buffers[self.write.index()].set(cell, color);
        let back = &mut self.buffers[back];
        match operation {
            BackBufferOperation::None => {}
            BackBufferOperation::Copy => back.set(cell, color),
            BackBufferOperation::Clear => back.set(cell, Color::OFF),
        }
    }

    pub fn set_brightness(&mut self, level: Brightness) {
        self.level = level;
    }

    /// Select the visible and write buffers.
    ///
    /// With `copy_visible_to_write`, the write buffer becomes an independent
    /// copy of the visible one. `auto_swap` is accepted and ignored.
    pub fn set_buffers(
        &mut self,
        visible: BufferId,
        write: BufferId,
        copy_visible_to_write: bool,
        auto_swap: bool,
    ) {
        self.visible = visible;
        self.write = write;
        if copy_visible_to_write {
            self.buffers[write.index()] = self.buffers[visible.index()];
        }
        if auto_swap {
            debug!("buffer auto-swap requested, not emulated");
        }
    }

    /// Light every cell of the write buffer with the brightest color.
    pub fn test_lights(&mut self, intensity: Brightness) {
        self.set_brightness(intensity);
        self.buffers[self.write.index()].fill(Color::AMBER);
    }

    pub fn set_lights(
        &mut self,
        _colors: &[Color],
        _operation: BackBufferOperation,
    ) -> Result<(), ProtocolError> {
        Err(ProtocolError::Unsupported("set_lights"))
    }

    pub fn scroll_text(
        &mut self,
        _text: &str,
        _color: Color,
        _speed: ScrollSpeed,
        _looping: bool,
        _operation: BackBufferOperation,
    ) -> Result<(), ProtocolError> {
        Err(ProtocolError::Unsupported("scroll_text"))
    }

    pub fn visible_buffer(&self) -> BufferId {
        self.visible
    }

    pub fn write_buffer(&self) -> BufferId {
        self.write
    }

    pub fn back_buffer(&self) -> BufferId {
        self.write.other()
    }

    pub fn buffer(&self, id: BufferId) -> &Buffer {
        &self.buffers[id.index()]
    }

    pub fn brightness_level(&self) -> Brightness {
        self.level
    }

    /// Opacity applied to lit cells.
    pub fn brightness(&self) -> f32 {
        self.level.opacity()
    }

    pub fn display_color(&self, control: Control) -> DisplayColor {
        resolve(self.buffer(self.visible).get(control), self.brightness())
    }

    /// Copy of everything a renderer needs, detached from further mutation.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            visible: *self.buffer(self.visible),
            brightness: self.brightness(),
        }
    }

    /// Install the sink for user interactions, replacing any previous one.
    pub fn set_listener<F>(&mut self, listener: F)
    where
        F: FnMut(Event) + 'static,
    {
        self.listener = Some(Box::new(listener));
    }

    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    pub fn on_pad_pressed(&mut self, pad: Pad) {
        self.notify(Event::PadPressed(pad));
    }

    pub fn on_pad_released(&mut self, pad: Pad) {
        self.notify(Event::PadReleased(pad));
    }

    pub fn on_button_pressed(&mut self, button: Button) {
        self.notify(Event::ButtonPressed(button));
    }

    pub fn on_button_released(&mut self, button: Button) {
        self.notify(Event::ButtonReleased(button));
    }

    /// Deliver an interaction to the listener right away. No listener, no-op.
    pub fn notify(&mut self, event: Event) {
        if let Some(listener) = self.listener.as_mut() {
            listener(event);
        }
    }
}

fn resolve(color: Option<Color>, brightness: f32) -> DisplayColor {
    let color = color.unwrap_or(Color::OFF);
    DisplayColor {
        rgb: color.rgb(),
        opacity: if color.is_off() { 1.0 } else { brightness },
    }
}

/// Immutable view of the visible buffer at one point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    visible: Buffer,
    brightness: f32,
}

impl Snapshot {
    pub fn display_color(&self, control: Control) -> DisplayColor {
        resolve(self.visible.get(control), self.brightness)
    }

    /// Every control with its resolved color.
    pub fn cells(&self) -> impl Iterator<Item = (Control, DisplayColor)> + '_ {
        Control::all().map(move |control| (control, self.display_color(control)))
    }

    /// Controls whose appearance differs from `previous`.
    pub fn changes<'a>(
        &'a self,
        previous: &'a Snapshot,
    ) -> impl Iterator<Item = (Control, DisplayColor)> + 'a {
        self.cells()
            .filter(move |(control, color)| previous.display_color(*control) != *color)
    }
}
