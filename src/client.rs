// ABOUTME: Client activation wiring — store, transports, session, dispatcher.
// ABOUTME: One activation per embedding surface; failures degrade, never abort.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast;

use banter_core::dispatch::Dispatcher;
use banter_core::registrar::{self, RoutingMode};
use banter_core::store::ConversationStore;
use banter_core::traits::{BackendChannel, ChannelEvent, EventChannel};

use crate::config::Config;
use crate::transport::{RestTransport, SocketTransport};

/// An activated client: dispatcher plus the resources it was wired with.
///
/// The embedding surface drives the dispatcher directly and, when a
/// persistent channel is connected, pumps its events back in:
///
/// ```ignore
/// let mut client = Client::activate(config).await?;
/// if let Some(mut events) = client.channel_events() {
///     while let Ok(event) = events.recv().await {
///         client.dispatcher_mut().handle_channel_event(event);
///     }
/// }
/// ```
pub struct Client {
    dispatcher: Dispatcher,
    realtime: Option<Arc<SocketTransport>>,
}

impl Client {
    /// Activate the client: open the store, resolve the device user id,
    /// establish the agent session (one-shot fallback on failure), and
    /// connect the persistent channel when configured.
    pub async fn activate(config: Config) -> Result<Self> {
        let store = ConversationStore::open(&config.storage.path)?;
        let backend: Arc<dyn BackendChannel> = Arc::new(RestTransport::new(&config.backend.base_url));

        let user_id = store.device_user_id();
        let routing = if config.backend.agent_mode {
            registrar::establish(backend.as_ref(), &user_id).await
        } else {
            tracing::info!("Agent mode disabled by config, using direct generation");
            RoutingMode::Direct
        };

        // A persistent channel that fails to open degrades the activation to
        // request/response only; it is not surfaced as an error message.
        let realtime = match &config.backend.socket_url {
            Some(url) => match SocketTransport::connect(url).await {
                Ok(transport) => Some(Arc::new(transport)),
                Err(e) => {
                    tracing::warn!(
                        url = %url,
                        error = %e,
                        "Persistent channel unavailable, using request/response only"
                    );
                    None
                }
            },
            None => None,
        };

        let dispatcher = Dispatcher::new(
            store,
            backend,
            realtime
                .clone()
                .map(|transport| transport as Arc<dyn EventChannel>),
            routing,
            config.backend.model.as_str(),
            config.backend.language.as_str(),
        );

        Ok(Self {
            dispatcher,
            realtime,
        })
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    /// Subscribe to persistent-channel events, if a channel is connected.
    pub fn channel_events(&self) -> Option<broadcast::Receiver<ChannelEvent>> {
        self.realtime.as_ref().map(|t| t.subscribe())
    }

    /// Flip and persist the theme preference flag, returning the new value.
    pub fn toggle_theme(&self) -> String {
        let store = self.dispatcher.store();
        let next = if store.theme() == "dark" {
            "light"
        } else {
            "dark"
        };
        store.set_theme(next);
        next.to_string()
    }

    /// Tear down the persistent channel. The store needs no teardown.
    pub fn shutdown(self) {
        if let Some(realtime) = self.realtime {
            realtime.close();
        }
    }
}
