use rst_common::standard::async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollingState {
    Idle,
    Running,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollingControl {
    Continue,
    Stop,
}

/// `PollingStep` is what one response changed: the events to deliver and whether polling
/// should go on
#[derive(Debug)]
pub struct PollingStep<TEvent> {
    pub events: Vec<TEvent>,
    pub control: PollingControl,
}

impl<TEvent> PollingStep<TEvent> {
    pub fn next(events: Vec<TEvent>) -> Self {
        Self {
            events,
            control: PollingControl::Continue,
        }
    }

    pub fn last(events: Vec<TEvent>) -> Self {
        Self {
            events,
            control: PollingControl::Stop,
        }
    }
}

/// `PollingSource` separates fetching, which may overlap between ticks, from applying,
/// which the service runs one at a time against `State`
#[async_trait]
pub trait PollingSource: Send + Sync + 'static {
    type Output: Send + 'static;
    type Event: Send + Sync + 'static;
    type State: Default + Send + 'static;

    async fn fetch(&self) -> Self::Output;
    fn apply(&self, state: &mut Self::State, output: Self::Output) -> PollingStep<Self::Event>;
}

pub trait PollingListener<TEvent>: Send + Sync {
    fn on_event(&self, event: &TEvent);
}

impl<TEvent, TFunc> PollingListener<TEvent> for TFunc
where
    TFunc: Fn(&TEvent) + Send + Sync,
{
    fn on_event(&self, event: &TEvent) {
        self(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(super) u64);
