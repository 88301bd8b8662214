use chrono::NaiveDate;
use egui::{Context, Id, Pos2, Rect, Vec2};

use crate::services::overlay::Overlay;
use crate::services::schedule::GridCell;

/// An overlay being dragged to another cell. Positions are grid-relative.
#[derive(Clone, Debug, PartialEq)]
pub struct DragContext {
    pub event_id: i64,
    pub original_date: Option<NaiveDate>,
    pub original_hour: i32,
    /// Minute offset inside the hour; kept when dropped elsewhere
    pub minute: u32,
    pub pointer_offset: Vec2,
    pub overlay_size: Vec2,
    pub pointer_pos: Option<Pos2>,
    pub hovered_date: Option<NaiveDate>,
    pub hovered_hour: Option<u32>,
    pub hovered_rect: Option<Rect>,
}

impl DragContext {
    /// Only saved, editable events can be dragged.
    pub fn from_overlay(overlay: &Overlay, pointer: Pos2) -> Option<Self> {
        let event_id = overlay.event.id?;
        if !overlay.event.can_edit {
            return None;
        }

        Some(Self {
            event_id,
            original_date: overlay.event.parsed_date(),
            original_hour: overlay.event.hours(),
            minute: overlay.event.minutes().max(0) as u32,
            pointer_offset: pointer - overlay.rect.min,
            overlay_size: overlay.rect.size(),
            pointer_pos: Some(pointer),
            hovered_date: None,
            hovered_hour: None,
            hovered_rect: None,
        })
    }

    /// Where the overlay preview is drawn while dragging.
    pub fn preview_rect(&self) -> Option<Rect> {
        self.pointer_pos
            .map(|pos| Rect::from_min_size(pos - self.pointer_offset, self.overlay_size))
    }

    /// Target cell, unless the pointer is back over the original one.
    pub fn drop_target(&self) -> Option<(NaiveDate, u32)> {
        let date = self.hovered_date?;
        let hour = self.hovered_hour?;
        if Some(date) == self.original_date && hour as i32 == self.original_hour {
            return None;
        }
        Some((date, hour))
    }
}

pub struct DragManager;

impl DragManager {
    fn storage_id() -> Id {
        Id::new("schedule_overlay_drag_state")
    }

    pub fn begin(ctx: &Context, context: DragContext) {
        ctx.memory_mut(|mem| {
            mem.data.insert_temp(Self::storage_id(), context);
        });
    }

    pub fn active(ctx: &Context) -> Option<DragContext> {
        ctx.memory(|mem| mem.data.get_temp::<DragContext>(Self::storage_id()))
    }

    pub fn is_active(ctx: &Context) -> bool {
        Self::active(ctx).is_some()
    }

    pub fn update_hover(ctx: &Context, cell: Option<&GridCell>, pointer_pos: Pos2) {
        let id = Self::storage_id();
        ctx.memory_mut(|mem| {
            if let Some(mut state) = mem.data.get_temp::<DragContext>(id) {
                state.hovered_date = cell.map(|c| c.date);
                state.hovered_hour = cell.map(|c| c.hour);
                state.hovered_rect = cell.map(|c| c.rect);
                state.pointer_pos = Some(pointer_pos);
                mem.data.insert_temp(id, state);
            }
        });
    }

    pub fn finish(ctx: &Context) -> Option<DragContext> {
        let id = Self::storage_id();
        ctx.memory_mut(|mem| {
            let current = mem.data.get_temp::<DragContext>(id);
            mem.data.remove::<DragContext>(id);
            current
        })
    }

    pub fn cancel(ctx: &Context) {
        ctx.memory_mut(|mem| {
            mem.data.remove::<DragContext>(Self::storage_id());
        });
    }
}
