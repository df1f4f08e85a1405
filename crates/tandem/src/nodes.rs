//! # Render Node Attributes
//!
//! Reference destinations for a scene graph. Each node's attributes are
//! written by scripts on the control thread and read by the renderer on the
//! execution thread.
//!
//! | id  | property        | type           | initial      |
//! |-----|-----------------|----------------|--------------|
//! | 1   | `enabled`       | `bool`         | `true`       |
//! | 2   | `rotation`      | `f32` degrees  | `0.0`        |
//! | 3   | `scale_x`       | `f32`          | `1.0`        |
//! | 4   | `scale_y`       | `f32`          | `1.0`        |
//! | 5   | `position`      | `Vec3`         | zero         |
//! | 6   | `alpha`         | `f32`          | `1.0`        |
//! | 7   | `render_set`    | sorted strings | `["**ALL**"]`|
//! | 8   | `visible_state` | `String`       | empty        |
//! | 100 | `res_path`      | `String`       | given        |
//! | 101 | `size`          | `Vec3`         | zero         |
//! | 102 | `vision_range`  | `f32`          | `0.0`        |
//!
//! Ids 1..=8 belong to every node, ids from 100 up to images.

use std::cmp::Ordering;
use std::sync::{Arc, Weak};

use tandem_core::{
    dispatch_to, Destination, DispatchOutcome, ListProperty, Property, PropertyBinding,
    RequestLink, RequestObject, SetResult, Vec3,
};

/// Render set every node belongs to unless told otherwise.
pub const ALL_RENDER_SETS: &str = "**ALL**";

/// Correlation ids of [`NodeAttributes`].
pub mod node_ids {
    use tandem_core::CorrelationId;

    /// `enabled`
    pub const ENABLED: CorrelationId = CorrelationId::new(1);
    /// `rotation`
    pub const ROTATION: CorrelationId = CorrelationId::new(2);
    /// `scale_x`
    pub const SCALE_X: CorrelationId = CorrelationId::new(3);
    /// `scale_y`
    pub const SCALE_Y: CorrelationId = CorrelationId::new(4);
    /// `position`
    pub const POSITION: CorrelationId = CorrelationId::new(5);
    /// `alpha`
    pub const ALPHA: CorrelationId = CorrelationId::new(6);
    /// `render_set`
    pub const RENDER_SET: CorrelationId = CorrelationId::new(7);
    /// `visible_state`
    pub const VISIBLE_STATE: CorrelationId = CorrelationId::new(8);
}

/// Correlation ids of [`ImageAttributes`].
pub mod image_ids {
    use tandem_core::CorrelationId;

    /// `res_path`
    pub const RES_PATH: CorrelationId = CorrelationId::new(100);
    /// `size`
    pub const SIZE: CorrelationId = CorrelationId::new(101);
    /// `vision_range`
    pub const VISION_RANGE: CorrelationId = CorrelationId::new(102);
}

/// Attributes shared by every render node.
pub struct NodeAttributes {
    /// Disabled nodes are never collected for rendering.
    pub enabled: Property<bool>,
    /// Rotation about Z, in degrees.
    pub rotation: Property<f32>,
    /// Horizontal scale.
    pub scale_x: Property<f32>,
    /// Vertical scale.
    pub scale_y: Property<f32>,
    /// Translation.
    pub position: Property<Vec3>,
    /// Opacity.
    pub alpha: Property<f32>,
    /// Render sets this node is drawn in, kept sorted.
    pub render_set: ListProperty<String>,
    /// Named visual state. See [`NodeAttributes::set_state`].
    pub visible_state: Property<String>,
}

impl NodeAttributes {
    /// Creates a standalone node.
    #[must_use]
    pub fn new(link: &RequestLink) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let owner: Weak<dyn Destination> = weak.clone();
            Self::with_binding(&PropertyBinding::new(owner, link.clone()))
        })
    }

    /// Creates the attributes for an entity that embeds them.
    ///
    /// The embedding entity is the destination and must route unclaimed
    /// requests to [`NodeAttributes::dispatch_base`].
    #[must_use]
    pub fn with_binding(binding: &PropertyBinding) -> Self {
        use node_ids::{
            ALPHA, ENABLED, POSITION, RENDER_SET, ROTATION, SCALE_X, SCALE_Y, VISIBLE_STATE,
        };

        Self {
            enabled: Property::new("enabled", ENABLED, binding, true),
            rotation: Property::new("rotation", ROTATION, binding, 0.0),
            scale_x: Property::new("scale_x", SCALE_X, binding, 1.0),
            scale_y: Property::new("scale_y", SCALE_Y, binding, 1.0),
            position: Property::new("position", POSITION, binding, Vec3::ZERO),
            alpha: Property::new("alpha", ALPHA, binding, 1.0),
            render_set: ListProperty::new_sorted(
                "render_set",
                RENDER_SET,
                binding,
                vec![ALL_RENDER_SETS.to_owned()],
            ),
            visible_state: Property::with_default("visible_state", VISIBLE_STATE, binding),
        }
    }

    /// Offers `request` to the node properties in id order.
    #[must_use]
    pub fn dispatch_base(&self, request: &RequestObject) -> DispatchOutcome {
        dispatch_to(
            request,
            &[
                &self.enabled,
                &self.rotation,
                &self.scale_x,
                &self.scale_y,
                &self.position,
                &self.alpha,
                &self.render_set,
                &self.visible_state,
            ],
        )
    }

    /// Control side: joins `render_set` if `state` is the node's visible
    /// state, leaves it otherwise.
    ///
    /// Only sends a request when membership actually changes.
    ///
    /// # Errors
    ///
    /// [`SetError`](tandem_core::SetError) if the request could not be
    /// issued.
    pub fn set_state_for(&self, render_set: &str, state: &str) -> SetResult<()> {
        let render_set = render_set.to_owned();
        if self.visible_state.get() == state {
            if !self.render_set.contains(&render_set) {
                self.render_set.push(render_set)?;
            }
        } else {
            self.render_set.remove(&render_set)?;
        }
        Ok(())
    }

    /// Control side: [`set_state_for`](Self::set_state_for) on
    /// [`ALL_RENDER_SETS`].
    ///
    /// # Errors
    ///
    /// [`SetError`](tandem_core::SetError) if the request could not be
    /// issued.
    pub fn set_state(&self, state: &str) -> SetResult<()> {
        self.set_state_for(ALL_RENDER_SETS, state)
    }

    /// Execution side: whether the node should be drawn for a frame that
    /// renders `render_sets`.
    ///
    /// `render_sets` must be sorted.
    #[must_use]
    pub fn collectable(&self, render_sets: &[String]) -> bool {
        self.enabled.execute_get()
            && self
                .render_set
                .execute_with(|own| sorted_intersects(own, render_sets))
    }

    /// Multi-line dump of every property, for debug overlays.
    #[must_use]
    pub fn describe(&self) -> String {
        [
            self.enabled.describe(),
            self.rotation.describe(),
            self.scale_x.describe(),
            self.scale_y.describe(),
            self.position.describe(),
            self.alpha.describe(),
            format!(
                "render_set({}) control={:?} execute={:?}",
                self.render_set.id(),
                self.render_set.get(),
                self.render_set.execute_get()
            ),
            self.visible_state.describe(),
        ]
        .join("\n")
    }
}

impl Destination for NodeAttributes {
    fn dispatch(&self, request: &RequestObject) -> DispatchOutcome {
        self.dispatch_base(request)
    }
}

/// Linear merge over two sorted lists.
fn sorted_intersects(a: &[String], b: &[String]) -> bool {
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => return true,
        }
    }
    false
}

/// A textured quad node.
pub struct ImageAttributes {
    /// Texture resource path.
    pub res_path: Property<String>,
    /// Quad size.
    pub size: Property<Vec3>,
    /// Distance beyond which the image is hidden.
    pub vision_range: Property<f32>,
    /// Common node attributes.
    pub base: NodeAttributes,
}

impl ImageAttributes {
    /// Creates an image node showing `res_path`.
    #[must_use]
    pub fn new(link: &RequestLink, res_path: impl Into<String>) -> Arc<Self> {
        use image_ids::{RES_PATH, SIZE, VISION_RANGE};

        let res_path = res_path.into();
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let owner: Weak<dyn Destination> = weak.clone();
            let binding = PropertyBinding::new(owner, link.clone());
            Self {
                res_path: Property::new("res_path", RES_PATH, &binding, res_path),
                size: Property::new("size", SIZE, &binding, Vec3::ZERO),
                vision_range: Property::new("vision_range", VISION_RANGE, &binding, 0.0),
                base: NodeAttributes::with_binding(&binding),
            }
        })
    }

    /// Execution side: see [`NodeAttributes::collectable`].
    #[must_use]
    pub fn collectable(&self, render_sets: &[String]) -> bool {
        self.base.collectable(render_sets)
    }
}

impl Destination for ImageAttributes {
    fn dispatch(&self, request: &RequestObject) -> DispatchOutcome {
        dispatch_to(request, &[&self.res_path, &self.size, &self.vision_range])
            .or_else(|| self.base.dispatch_base(request))
    }
}
