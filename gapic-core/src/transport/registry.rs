//! # Transport Registry
//!
//! An ordered table of transport factories keyed by a label. A client built without an explicit
//! transport label gets the first registered one.
use super::{
    credentials::{Credentials, CredentialsProvider},
    grpc::{ConnectError, GrpcTransport},
};
use crate::options::ClientOptions;

/// Builds a transport from connection settings and resolved credentials.
pub type TransportFactory<T> = fn(&ClientOptions, Option<Credentials>) -> Result<T, ConnectError>;

pub struct TransportRegistry<T> {
    factories: Vec<(&'static str, TransportFactory<T>)>,
}

impl<T> TransportRegistry<T> {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            factories: Vec::new(),
        }
    }

    /// Adds a factory. Registering an existing label replaces its factory but keeps its position.
    pub fn register(mut self, label: &'static str, factory: TransportFactory<T>) -> Self {
        match self.factories.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 = factory,
            None => self.factories.push((label, factory)),
        }
        self
    }

    pub fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.iter().map(|(label, _)| *label)
    }

    /// Looks a factory up. `None` selects the default, which is the first registered one.
    pub fn factory(&self, label: Option<&str>) -> Result<TransportFactory<T>, ConnectError> {
        match label {
            None => self
                .factories
                .first()
                .map(|(_, factory)| *factory)
                .ok_or(ConnectError::EmptyRegistry),
            Some(label) => self
                .factories
                .iter()
                .find(|(l, _)| *l == label)
                .map(|(_, factory)| *factory)
                .ok_or_else(|| ConnectError::UnknownTransport(label.to_string())),
        }
    }

    /// Resolves credentials and builds the transport named by `options.transport`.
    pub fn create(
        &self,
        options: &ClientOptions,
        credentials: &dyn CredentialsProvider,
    ) -> Result<T, ConnectError> {
        let factory = self.factory(options.transport.as_deref())?;
        let credentials = credentials.credentials()?;

        tracing::debug!(
            transport = options.transport.as_deref().unwrap_or("<default>"),
            endpoint = %options.uri(),
            authenticated = credentials.is_some(),
            "creating transport"
        );
        factory(options, credentials)
    }
}

impl Default for TransportRegistry<GrpcTransport> {
    /// A registry with the `grpc` transport as its only, and therefore default, entry.
    fn default() -> Self {
        Self::new().register("grpc", GrpcTransport::connect_lazy)
    }
}
