use super::{ControlId, ParamError, ParamInput, ParamValue, ParamValues};
use std::collections::HashMap;

/// Change handler. Receives the propagation target and the full value set;
/// handlers re-read whatever they need instead of getting a payload.
pub type Subscriber<S> = Box<dyn FnMut(&mut S, &ParamValues)>;

/// Parameter values plus an observer registry keyed by control.
///
/// `S` is the state subscribers mutate. It is passed in on every write
/// rather than captured, so the store never shares ownership of it.
pub struct ParameterStore<S> {
    values: ParamValues,
    subscribers: Vec<Subscriber<S>>,
    routes: HashMap<ControlId, Vec<usize>>,
}

impl<S> Default for ParameterStore<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> ParameterStore<S> {
    pub fn new() -> Self {
        Self {
            values: ParamValues::default(),
            subscribers: Vec::new(),
            routes: HashMap::new(),
        }
    }

    pub fn values(&self) -> &ParamValues {
        &self.values
    }

    /// Register one handler for several controls. It runs once per write to
    /// any of them.
    pub fn subscribe<F>(&mut self, controls: &[ControlId], subscriber: F)
    where
        F: FnMut(&mut S, &ParamValues) + 'static,
    {
        let index = self.subscribers.len();
        self.subscribers.push(Box::new(subscriber));
        for control in controls {
            let route = self.routes.entry(*control).or_default();
            if !route.contains(&index) {
                route.push(index);
            }
        }
    }

    pub fn subscriber_count(&self, control: ControlId) -> usize {
        self.routes.get(&control).map_or(0, Vec::len)
    }

    /// Validate, store, then synchronously run every subscriber of `control`.
    pub fn set<'a>(
        &mut self,
        target: &mut S,
        control: ControlId,
        input: impl Into<ParamInput<'a>>,
    ) -> Result<ParamValue, ParamError> {
        let input = input.into();
        let accepted = control.domain().accept(control, input)?;
        if accepted.clamped {
            log::debug!("{} clamped {:?} -> {:?}", control, input, accepted.value);
        }
        self.values.write(control, accepted.value);
        self.notify(target, control);
        Ok(accepted.value)
    }

    pub fn set_named<'a>(
        &mut self,
        target: &mut S,
        name: &str,
        input: impl Into<ParamInput<'a>>,
    ) -> Result<ParamValue, ParamError> {
        let control: ControlId = name.parse()?;
        self.set(target, control, input)
    }

    /// Re-run the subscribers of `control` against the current values.
    pub fn notify(&mut self, target: &mut S, control: ControlId) {
        let Self {
            values,
            subscribers,
            routes,
        } = self;
        let Some(route) = routes.get(&control) else {
            return;
        };
        for &index in route {
            if let Some(subscriber) = subscribers.get_mut(index) {
                subscriber(target, values);
            }
        }
    }
}
