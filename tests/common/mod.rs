#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::header::AUTHORIZATION;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use streamchat::api::{ChatBackend, ChatTransport, EventStream, RequestBody, StreamEvent};
use streamchat::error::{ChatError, Result};
use streamchat::session::{Notice, Route, SessionHooks};

pub enum Script {
    /// Deliver these events, then end the stream.
    Events(Vec<StreamEvent>),
    /// Deliver these events, then never finish.
    Hang(Vec<StreamEvent>),
    /// Deliver these events, then fail the stream with this error.
    EventsThenFail(Vec<StreamEvent>, ChatError),
    /// Fail before any data arrives.
    FailToOpen(ChatError),
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub endpoint: String,
    pub authorization: Option<String>,
    pub body: RequestBody,
}

#[derive(Default)]
pub struct ScriptedBackend {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedBackend {
    pub fn new(scripts: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn open_stream(
        &self,
        transport: &ChatTransport,
        body: RequestBody,
    ) -> Result<EventStream> {
        let headers = transport.headers().await?;
        let authorization = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        self.requests.lock().unwrap().push(RecordedRequest {
            endpoint: transport.endpoint().to_string(),
            authorization,
            body,
        });

        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ChatError::Other("no scripted response left".to_string()))?;

        match script {
            Script::Events(events) => Ok(stream::iter(events.into_iter().map(Ok)).boxed()),
            Script::Hang(events) => Ok(stream::iter(events.into_iter().map(Ok))
                .chain(stream::pending())
                .boxed()),
            Script::EventsThenFail(events, error) => Ok(stream::iter(events.into_iter().map(Ok))
                .chain(stream::once(async move { Err(error) }))
                .boxed()),
            Script::FailToOpen(error) => Err(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HookEvent {
    Notice(Notice),
    Navigate(Route),
    Finish,
    InitialPromptSent,
}

#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<HookEvent>>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<HookEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, wanted: &HookEvent) -> usize {
        self.events().iter().filter(|e| *e == wanted).count()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                HookEvent::Notice(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    pub fn routes(&self) -> Vec<Route> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                HookEvent::Navigate(r) => Some(r),
                _ => None,
            })
            .collect()
    }
}

impl SessionHooks for Recorder {
    fn notify(&mut self, notice: Notice) {
        self.events.lock().unwrap().push(HookEvent::Notice(notice));
    }

    fn navigate(&mut self, route: Route) {
        self.events.lock().unwrap().push(HookEvent::Navigate(route));
    }

    fn on_finish(&mut self) {
        self.events.lock().unwrap().push(HookEvent::Finish);
    }

    fn on_initial_prompt_sent(&mut self) {
        self.events.lock().unwrap().push(HookEvent::InitialPromptSent);
    }
}
