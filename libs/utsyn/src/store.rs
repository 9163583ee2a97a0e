//! The single source of truth for filter UI state, one instance per session.
//! All mutation goes through named operations so the invariants live in one
//! place; interested parties observe changes through `subscribe`.

use std::mem;
use std::rc::Rc;

use fasteign::PropertyType;
use geojson::FeatureCollection;

/// Draft values of the filter form. `None` renders as "unset".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterFields {
    pub property_type: Option<PropertyType>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub bedrooms: Option<f64>,
    pub bathrooms: Option<f64>,
    pub area_min: Option<f64>,
    pub area_max: Option<f64>,
}

#[derive(Clone, Debug, Default)]
pub struct FilterState {
    pub fields: FilterFields,
    pub is_expanded: bool,
    pub is_applied: bool,
    /// Whether the dynamic filtered layer should replace the static tile
    /// layer. The synchronizer additionally requires `filtered` to be
    /// present before it treats the map as filtered.
    pub is_filter_active: bool,
    /// Result of the last successful filter fetch; replaced wholesale.
    pub filtered: Option<Rc<FeatureCollection>>,
}

/// One draft-field edit; `None` clears the field back to unset.
#[derive(Clone, Debug, PartialEq)]
pub enum Field {
    PropertyType(Option<PropertyType>),
    PriceMin(Option<f64>),
    PriceMax(Option<f64>),
    Bedrooms(Option<f64>),
    Bathrooms(Option<f64>),
    AreaMin(Option<f64>),
    AreaMax(Option<f64>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListenerId(usize);

type Listener = Box<dyn FnMut(&FilterState)>;

#[derive(Default)]
pub struct FilterStore {
    state: FilterState,
    listeners: Vec<(usize, Listener)>,
    next_listener: usize,
}

impl FilterStore {
    pub fn new() -> FilterStore {
        FilterStore::default()
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&FilterState) + 'static) -> ListenerId {
        let id = self.next_listener;
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        ListenerId(id)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) {
        self.listeners.retain(|(l, _)| *l != id.0);
    }

    fn notify(&mut self) {
        // Listeners run against a stable snapshot; subscriptions made while
        // notifying are collected and kept.
        let mut current = mem::replace(&mut self.listeners, Vec::new());
        for (_, listener) in current.iter_mut() {
            listener(&self.state);
        }
        let mut added = mem::replace(&mut self.listeners, current);
        self.listeners.append(&mut added);
    }

    /// Merge draft edits into the current fields. No validation happens
    /// here; criteria are built at submit time.
    pub fn set_fields(&mut self, edits: impl IntoIterator<Item = Field>) {
        for edit in edits {
            match edit {
                Field::PropertyType(v) => self.state.fields.property_type = v,
                Field::PriceMin(v) => self.state.fields.price_min = v,
                Field::PriceMax(v) => self.state.fields.price_max = v,
                Field::Bedrooms(v) => self.state.fields.bedrooms = v,
                Field::Bathrooms(v) => self.state.fields.bathrooms = v,
                Field::AreaMin(v) => self.state.fields.area_min = v,
                Field::AreaMax(v) => self.state.fields.area_max = v,
            }
        }
        self.notify();
    }

    /// Mark the current draft as applied and activate the filtered layer.
    pub fn apply(&mut self) {
        self.state.is_applied = true;
        self.state.is_filter_active = true;
        self.notify();
    }

    /// Reset every field to its unset default and collapse the panel.
    pub fn clear(&mut self) {
        self.state = FilterState::default();
        self.notify();
    }

    pub fn toggle_expanded(&mut self) {
        self.state.is_expanded = !self.state.is_expanded;
        self.notify();
    }

    /// Store the collection fetched by one filter submission, replacing any
    /// prior result.
    pub fn set_filtered(&mut self, filtered: Option<Rc<FeatureCollection>>) {
        self.state.filtered = filtered;
        self.notify();
    }

    /// Escape hatch for programmatic activation independent of a fetch.
    pub fn set_active(&mut self, active: bool) {
        self.state.is_filter_active = active;
        self.notify();
    }
}
