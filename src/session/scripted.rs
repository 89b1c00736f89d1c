//! In-memory browsing engine for unit tests
//!
//! Pages are registered per URL as a queue of responses: each navigation
//! pops the front response, and the last one keeps being served.

use crate::session::{Browser, BrowsingContext, LoadedPage};
use crate::{IngestError, NavigationError};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub(crate) enum Scripted {
    Html(String),
    Fail(NavigationError),
    Slow(Duration, String),
}

#[derive(Default)]
struct Script {
    pages: HashMap<String, VecDeque<Scripted>>,
    requests: Vec<String>,
    contexts_opened: usize,
    contexts_open: usize,
    refuse_contexts: bool,
}

#[derive(Clone, Default)]
pub(crate) struct ScriptedBrowser {
    script: Arc<Mutex<Script>>,
}

impl ScriptedBrowser {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn page(&self, url: &str, html: impl Into<String>) -> &Self {
        self.respond(url, vec![Scripted::Html(html.into())])
    }

    pub(crate) fn respond(&self, url: &str, responses: Vec<Scripted>) -> &Self {
        let mut script = self.script.lock().unwrap();
        script
            .pages
            .insert(url.to_string(), responses.into_iter().collect());
        self
    }

    pub(crate) fn refuse_contexts(&self) {
        self.script.lock().unwrap().refuse_contexts = true;
    }

    /// Every URL navigated to, in order
    pub(crate) fn requests(&self) -> Vec<String> {
        self.script.lock().unwrap().requests.clone()
    }

    pub(crate) fn request_count(&self, url: &str) -> usize {
        self.requests().iter().filter(|u| u.as_str() == url).count()
    }

    pub(crate) fn contexts_opened(&self) -> usize {
        self.script.lock().unwrap().contexts_opened
    }

    fn next_response(&self, url: &str) -> Scripted {
        let mut script = self.script.lock().unwrap();
        script.requests.push(url.to_string());

        match script.pages.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap(),
            None => Scripted::Fail(NavigationError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

#[async_trait]
impl Browser for ScriptedBrowser {
    async fn new_context(&self) -> Result<Box<dyn BrowsingContext>, IngestError> {
        let mut script = self.script.lock().unwrap();
        if script.refuse_contexts {
            return Err(IngestError::SessionAcquisition(
                "browser is not running".to_string(),
            ));
        }
        script.contexts_opened += 1;
        script.contexts_open += 1;

        Ok(Box::new(ScriptedContext {
            browser: self.clone(),
            current: None,
        }))
    }

    fn active_contexts(&self) -> usize {
        self.script.lock().unwrap().contexts_open
    }
}

struct ScriptedContext {
    browser: ScriptedBrowser,
    current: Option<LoadedPage>,
}

#[async_trait]
impl BrowsingContext for ScriptedContext {
    async fn navigate(&mut self, url: &str) -> Result<LoadedPage, NavigationError> {
        let html = match self.browser.next_response(url) {
            Scripted::Html(html) => html,
            Scripted::Fail(err) => return Err(err),
            Scripted::Slow(delay, html) => {
                tokio::time::sleep(delay).await;
                html
            }
        };

        let page = LoadedPage {
            url: url.to_string(),
            status: 200,
            html,
        };
        self.current = Some(page.clone());
        Ok(page)
    }

    fn current_page(&self) -> Option<&LoadedPage> {
        self.current.as_ref()
    }

    async fn close(self: Box<Self>) {}
}

impl Drop for ScriptedContext {
    fn drop(&mut self) {
        self.browser.script.lock().unwrap().contexts_open -= 1;
    }
}
