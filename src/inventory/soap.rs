// file: src/inventory/soap.rs
// version: 1.0.0
// guid: 8c1c8957-c05b-4560-9305-23aae05ebb5d

//! vSphere Web Services (SOAP) inventory backend
//!
//! Talks to `https://{host}:{port}/sdk`. The session cookie set by `Login`
//! is kept by the HTTP client's cookie store.

use super::session::{ContainerView, Endpoint, InventoryConnector, InventorySession};
use super::xml::{self, Element, ManagedRef, NamedObject, ServiceContent};
use super::{EntityKind, InventoryNode};
use crate::error::ResolverError;
use crate::Result;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

/// Opens [`Vim25Session`]s
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vim25Connector {
    scheme: String,
}

impl Vim25Connector {
    pub fn new() -> Self {
        Self::with_scheme("https")
    }

    /// Connector using another URL scheme, e.g. `http` behind a TLS proxy
    pub fn with_scheme(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
        }
    }
}

impl Default for Vim25Connector {
    fn default() -> Self {
        Self::new()
    }
}

/// Authenticated vSphere Web Services session
pub struct Vim25Session {
    client: Client,
    url: Url,
    soap_action: String,
    content: ServiceContent,
}

/// `{scheme}://host:port/sdk`, bracketing bare IPv6 literals
pub fn sdk_url(scheme: &str, host: &str, port: u16) -> Result<Url> {
    let host = if host.contains(':') && !host.starts_with('[') {
        format!("[{}]", host)
    } else {
        host.to_string()
    };
    Url::parse(&format!("{}://{}:{}/sdk", scheme, host, port))
        .map_err(|e| ResolverError::config(format!("Invalid vCenter address {}: {}", host, e)))
}

async fn post(client: &Client, url: &Url, soap_action: &str, body: String) -> Result<Element> {
    let resp = client
        .post(url.clone())
        .header(CONTENT_TYPE, "text/xml; charset=utf-8")
        .header("SOAPAction", soap_action)
        .body(body)
        .send()
        .await?;

    let status = resp.status();
    let text = resp.text().await?;

    let root = match xml::parse_document(&text) {
        Ok(root) => root,
        Err(_) if !status.is_success() => {
            return Err(ResolverError::Http(format!("HTTP {} from {}", status, url)))
        }
        Err(e) => return Err(e),
    };

    if let Some(fault) = xml::fault(&root) {
        return Err(fault);
    }
    if !status.is_success() {
        return Err(ResolverError::Http(format!("HTTP {} from {}", status, url)));
    }

    Ok(root)
}

#[async_trait::async_trait]
impl InventoryConnector for Vim25Connector {
    type Session = Vim25Session;

    async fn open(&self, endpoint: &Endpoint) -> Result<Vim25Session> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .danger_accept_invalid_certs(!endpoint.verify_tls);
        if let Some(timeout) = endpoint.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = endpoint.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            ResolverError::other(format!("Failed to build HTTP client: {}", e))
        })?;

        let url = sdk_url(&self.scheme, &endpoint.host, endpoint.port)?;
        let soap_action = format!("urn:vim25/{}", endpoint.api_version);

        let root = post(&client, &url, &soap_action, xml::retrieve_service_content()).await?;
        let content = xml::parse_service_content(&root)?;

        post(
            &client,
            &url,
            &soap_action,
            xml::login(&content.session_manager, &endpoint.username, &endpoint.password),
        )
        .await?;

        info!("Logged in to {} as {}", endpoint.host, endpoint.username);
        Ok(Vim25Session {
            client,
            url,
            soap_action,
            content,
        })
    }
}

impl Vim25Session {
    async fn call(&self, body: String) -> Result<Element> {
        post(&self.client, &self.url, &self.soap_action, body).await
    }

    /// Run a property retrieval, following continuation tokens
    async fn retrieve_all(&self, body: String) -> Result<Vec<NamedObject>> {
        let mut page = xml::parse_retrieve_page(&self.call(body).await?)?;
        let mut objects = std::mem::take(&mut page.objects);

        while let Some(token) = page.token.take() {
            let body = xml::continue_retrieve(&self.content.property_collector, &token);
            page = xml::parse_retrieve_page(&self.call(body).await?)?;
            objects.append(&mut page.objects);
        }

        Ok(objects)
    }

    pub fn service_content(&self) -> &ServiceContent {
        &self.content
    }
}

fn to_ref(node: &InventoryNode) -> ManagedRef {
    ManagedRef::new(node.kind.vim_type(), node.id.clone())
}

fn to_nodes(objects: Vec<NamedObject>) -> Vec<InventoryNode> {
    objects
        .into_iter()
        .filter_map(|object| {
            let kind = match EntityKind::from_vim_type(&object.obj.kind) {
                Some(kind) => kind,
                None => {
                    debug!("Skipping object of type {}", object.obj.kind);
                    return None;
                }
            };
            let name = match object.name {
                Some(name) => name,
                None => {
                    debug!("Skipping {} without a name", object.obj.value);
                    return None;
                }
            };
            Some(InventoryNode::new(kind, object.obj.value, name))
        })
        .collect()
}

#[async_trait::async_trait]
impl InventorySession for Vim25Session {
    async fn root_folder(&self) -> Result<InventoryNode> {
        let root = &self.content.root_folder;
        Ok(InventoryNode::new(
            EntityKind::Folder,
            root.value.clone(),
            root.value.clone(),
        ))
    }

    async fn create_container_view(
        &self,
        container: &InventoryNode,
        kinds: &[EntityKind],
        recursive: bool,
    ) -> Result<ContainerView> {
        let types: Vec<&str> = kinds.iter().map(|k| k.vim_type()).collect();
        let body = xml::create_container_view(
            &self.content.view_manager,
            &to_ref(container),
            &types,
            recursive,
        );
        let view = xml::parse_returned_ref(&self.call(body).await?)?;

        let objects = self
            .retrieve_all(xml::retrieve_view_names(
                &self.content.property_collector,
                &view,
                &types,
            ))
            .await?;

        Ok(ContainerView {
            id: view.value,
            view: to_nodes(objects),
        })
    }

    async fn destroy_view(&self, view: &ContainerView) -> Result<()> {
        let view = ManagedRef::new("ContainerView", view.id.clone());
        self.call(xml::destroy_view(&view)).await?;
        Ok(())
    }

    async fn host_attachments(
        &self,
        host: &InventoryNode,
        kind: EntityKind,
    ) -> Result<Vec<InventoryNode>> {
        let path = match kind {
            EntityKind::Datastore => "datastore",
            EntityKind::Network | EntityKind::DistributedPortGroup => "network",
            other => {
                return Err(ResolverError::other(format!(
                    "Hosts have no {:?} attachments",
                    other
                )))
            }
        };

        let objects = self
            .retrieve_all(xml::retrieve_property_names(
                &self.content.property_collector,
                &to_ref(host),
                path,
                &[kind.vim_type()],
            ))
            .await?;
        Ok(to_nodes(objects))
    }

    async fn disconnect(&self) -> Result<()> {
        self.call(xml::logout(&self.content.session_manager)).await?;
        debug!("Logged out of {}", self.url);
        Ok(())
    }
}
