// file: src/inventory/xml.rs
// version: 1.0.0
// guid: 3ed2bc68-270f-4aea-87e5-718aec38ba69

//! vSphere Web Services envelopes and response parsing

use crate::error::ResolverError;
use crate::Result;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::str;

/// Managed object reference (`<obj type="Datacenter">datacenter-2</obj>`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedRef {
    pub kind: String,
    pub value: String,
}

impl ManagedRef {
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

/// Entry points returned by `RetrieveServiceContent`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceContent {
    pub root_folder: ManagedRef,
    pub property_collector: ManagedRef,
    pub view_manager: ManagedRef,
    pub session_manager: ManagedRef,
}

/// One object of a `RetrievePropertiesEx` result with its `name` property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedObject {
    pub obj: ManagedRef,
    pub name: Option<String>,
}

/// One page of a property retrieval
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrievePage {
    pub objects: Vec<NamedObject>,
    pub token: Option<String>,
}

// ── Envelopes ───────────────────────────────────────────────────────

const SERVICE_INSTANCE: &str = r#"<_this type="ServiceInstance">ServiceInstance</_this>"#;

/// Wrap a request body in a SOAP envelope
pub fn envelope(body: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/""#,
            r#" xmlns:xsd="http://www.w3.org/2001/XMLSchema""#,
            r#" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            "<soapenv:Body>{}</soapenv:Body></soapenv:Envelope>"
        ),
        body
    )
}

fn moref(tag: &str, r: &ManagedRef) -> String {
    format!(
        r#"<{tag} type="{}">{}</{tag}>"#,
        escape(r.kind.as_str()),
        escape(r.value.as_str()),
        tag = tag
    )
}

fn method(name: &str, this: &ManagedRef, args: &str) -> String {
    format!(
        r#"<{name} xmlns="urn:vim25">{}{}</{name}>"#,
        moref("_this", this),
        args,
        name = name
    )
}

pub fn retrieve_service_content() -> String {
    envelope(&format!(
        r#"<RetrieveServiceContent xmlns="urn:vim25">{}</RetrieveServiceContent>"#,
        SERVICE_INSTANCE
    ))
}

pub fn login(session_manager: &ManagedRef, username: &str, password: &str) -> String {
    envelope(&method(
        "Login",
        session_manager,
        &format!(
            "<userName>{}</userName><password>{}</password>",
            escape(username),
            escape(password)
        ),
    ))
}

pub fn logout(session_manager: &ManagedRef) -> String {
    envelope(&method("Logout", session_manager, ""))
}

pub fn create_container_view(
    view_manager: &ManagedRef,
    container: &ManagedRef,
    types: &[&str],
    recursive: bool,
) -> String {
    let mut args = moref("container", container);
    for t in types {
        args.push_str(&format!("<type>{}</type>", escape(*t)));
    }
    args.push_str(&format!("<recursive>{}</recursive>", recursive));
    envelope(&method("CreateContainerView", view_manager, &args))
}

pub fn destroy_view(view: &ManagedRef) -> String {
    envelope(&method("DestroyView", view, ""))
}

fn name_prop_sets(types: &[&str]) -> String {
    types
        .iter()
        .map(|t| format!("<propSet><type>{}</type><pathSet>name</pathSet></propSet>", escape(*t)))
        .collect()
}

fn traversal(name: &str, from_type: &str, path: &str) -> String {
    format!(
        concat!(
            r#"<selectSet xsi:type="TraversalSpec"><name>{}</name>"#,
            "<type>{}</type><path>{}</path><skip>false</skip></selectSet>"
        ),
        name, from_type, path
    )
}

/// Names of every object in a container view
pub fn retrieve_view_names(collector: &ManagedRef, view: &ManagedRef, types: &[&str]) -> String {
    let spec = format!(
        "<specSet>{}<objectSet>{}<skip>true</skip>{}</objectSet></specSet><options></options>",
        name_prop_sets(types),
        moref("obj", view),
        traversal("traverseView", "ContainerView", "view")
    );
    envelope(&method("RetrievePropertiesEx", collector, &spec))
}

/// Names of the objects referenced by a property of `source`, e.g. the
/// `datastore` property of a `HostSystem`
pub fn retrieve_property_names(
    collector: &ManagedRef,
    source: &ManagedRef,
    path: &str,
    target_types: &[&str],
) -> String {
    let spec = format!(
        "<specSet>{}<objectSet>{}<skip>true</skip>{}</objectSet></specSet><options></options>",
        name_prop_sets(target_types),
        moref("obj", source),
        traversal("traverseProperty", &source.kind, path)
    );
    envelope(&method("RetrievePropertiesEx", collector, &spec))
}

pub fn continue_retrieve(collector: &ManagedRef, token: &str) -> String {
    envelope(&method(
        "ContinueRetrievePropertiesEx",
        collector,
        &format!("<token>{}</token>", escape(token)),
    ))
}

// ── Parsing ─────────────────────────────────────────────────────────

/// Minimal element tree; names are local (namespace prefix stripped),
/// attribute keys are kept qualified (`xsi:type`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First element named `name` in document order, including `self`
    pub fn descendant(&self, name: &str) -> Option<&Element> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.descendant(name))
    }

    fn as_ref_value(&self) -> Result<ManagedRef> {
        let kind = self.attr("type").ok_or_else(|| {
            ResolverError::protocol(format!("<{}> is missing its type attribute", self.name))
        })?;
        Ok(ManagedRef::new(kind, self.text.clone()))
    }
}

fn start_element(e: &BytesStart) -> Result<Element> {
    let local = e.local_name();
    let name = str::from_utf8(local.as_ref())
        .map_err(|_| ResolverError::protocol("Invalid UTF-8 in tag name"))?
        .to_string();

    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| ResolverError::protocol(e.to_string()))?;
        let key = str::from_utf8(attr.key.as_ref())
            .map_err(|_| ResolverError::protocol("Invalid UTF-8 in attribute name"))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| ResolverError::protocol(e.to_string()))?
            .to_string();
        attrs.push((key, value));
    }

    Ok(Element {
        name,
        attrs,
        ..Element::default()
    })
}

/// Parse a document into an element tree under a synthetic unnamed root
pub fn parse_document(xml: &str) -> Result<Element> {
    // Leaf text is kept verbatim
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<Element> = vec![Element::default()];

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => stack.push(start_element(e)?),
            Ok(Event::Empty(ref e)) => {
                let element = start_element(e)?;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(element);
                }
            }
            Ok(Event::End(_)) => {
                if stack.len() < 2 {
                    return Err(ResolverError::protocol("Unbalanced closing tag"));
                }
                if let Some(mut element) = stack.pop() {
                    drop_layout_text(&mut element);
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(element);
                    }
                }
            }
            Ok(Event::Text(ref t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| ResolverError::protocol(e.to_string()))?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            Ok(Event::CData(ref c)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(c.as_ref()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ResolverError::protocol(format!(
                    "XML error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    if stack.len() != 1 {
        return Err(ResolverError::protocol("Truncated XML document"));
    }
    let mut root = stack
        .pop()
        .ok_or_else(|| ResolverError::protocol("Empty XML document"))?;
    drop_layout_text(&mut root);
    Ok(root)
}

/// SOAP has no mixed content: text beside child elements is indentation
fn drop_layout_text(element: &mut Element) {
    if !element.children.is_empty() {
        element.text.clear();
    }
}

/// SOAP fault carried by a response, if any
pub fn fault(root: &Element) -> Option<ResolverError> {
    let fault = root.descendant("Fault")?;
    let code = fault
        .child("faultcode")
        .map(|c| c.text.clone())
        .unwrap_or_default();
    let message = fault
        .child("faultstring")
        .map(|c| c.text.clone())
        .unwrap_or_default();

    let detail = fault.child("detail").and_then(|d| d.children.first());
    let fault_type = detail
        .map(|d| {
            d.attr("xsi:type")
                .map(str::to_string)
                .unwrap_or_else(|| d.name.trim_end_matches("Fault").to_string())
        })
        .unwrap_or_default();

    if fault_type == "InvalidLogin" {
        return Some(ResolverError::auth(message));
    }
    if fault_type.is_empty() {
        Some(ResolverError::soap(code, message))
    } else {
        Some(ResolverError::soap(code, format!("{} ({})", message, fault_type)))
    }
}

fn returnval(root: &Element) -> Result<&Element> {
    root.descendant("returnval")
        .ok_or_else(|| ResolverError::protocol("Response has no returnval"))
}

pub fn parse_service_content(root: &Element) -> Result<ServiceContent> {
    let content = returnval(root)?;
    let field = |name: &str| -> Result<ManagedRef> {
        content
            .child(name)
            .ok_or_else(|| ResolverError::protocol(format!("Service content has no {}", name)))?
            .as_ref_value()
    };

    Ok(ServiceContent {
        root_folder: field("rootFolder")?,
        property_collector: field("propertyCollector")?,
        view_manager: field("viewManager")?,
        session_manager: field("sessionManager")?,
    })
}

/// Managed reference returned by a method such as `CreateContainerView`
pub fn parse_returned_ref(root: &Element) -> Result<ManagedRef> {
    returnval(root)?.as_ref_value()
}

/// One page of `RetrievePropertiesEx` results; no `returnval` means no
/// matching objects
pub fn parse_retrieve_page(root: &Element) -> Result<RetrievePage> {
    let result = match root.descendant("returnval") {
        Some(result) => result,
        None => return Ok(RetrievePage::default()),
    };

    let mut objects = Vec::new();
    for content in result.children_named("objects") {
        let obj = content
            .child("obj")
            .ok_or_else(|| ResolverError::protocol("Object content has no obj"))?
            .as_ref_value()?;
        let name = content
            .children_named("propSet")
            .find(|p| p.child("name").map(|n| n.text.as_str()) == Some("name"))
            .and_then(|p| p.child("val"))
            .map(|v| v.text.clone());
        objects.push(NamedObject { obj, name });
    }

    let token = result
        .child("token")
        .map(|t| t.text.clone())
        .filter(|t| !t.is_empty());

    Ok(RetrievePage { objects, token })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVICE_CONTENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
<soapenv:Body>
<RetrieveServiceContentResponse xmlns="urn:vim25"><returnval>
  <rootFolder type="Folder">group-d1</rootFolder>
  <propertyCollector type="PropertyCollector">propertyCollector</propertyCollector>
  <viewManager type="ViewManager">ViewManager</viewManager>
  <about><name>VMware vCenter Server</name><apiVersion>6.7.3</apiVersion></about>
  <sessionManager type="SessionManager">SessionManager</sessionManager>
</returnval></RetrieveServiceContentResponse>
</soapenv:Body></soapenv:Envelope>"#;

    const PAGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:xsd="http://www.w3.org/2001/XMLSchema">
<soapenv:Body><RetrievePropertiesExResponse xmlns="urn:vim25"><returnval>
<token>1</token>
<objects><obj type="Datacenter">datacenter-2</obj><propSet><name>name</name><val xsi:type="xsd:string">DC &amp; Lab</val></propSet></objects>
<objects><obj type="Datacenter">datacenter-21</obj><propSet><name>name</name><val xsi:type="xsd:string">Edge</val></propSet></objects>
</returnval></RetrievePropertiesExResponse></soapenv:Body></soapenv:Envelope>"#;

    const INVALID_LOGIN: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
<soapenv:Body><soapenv:Fault><faultcode>ServerFaultCode</faultcode>
<faultstring>Cannot complete login due to an incorrect user name or password.</faultstring>
<detail><InvalidLoginFault xmlns="urn:vim25" xsi:type="InvalidLogin"></InvalidLoginFault></detail>
</soapenv:Fault></soapenv:Body></soapenv:Envelope>"#;

    #[test]
    fn test_parse_service_content() -> Result<()> {
        let root = parse_document(SERVICE_CONTENT)?;
        assert!(fault(&root).is_none());

        let content = parse_service_content(&root)?;
        assert_eq!(content.root_folder, ManagedRef::new("Folder", "group-d1"));
        assert_eq!(content.view_manager.value, "ViewManager");
        assert_eq!(content.session_manager.kind, "SessionManager");
        Ok(())
    }

    #[test]
    fn test_parse_retrieve_page() -> Result<()> {
        let page = parse_retrieve_page(&parse_document(PAGE)?)?;
        assert_eq!(page.token.as_deref(), Some("1"));
        assert_eq!(page.objects.len(), 2);
        assert_eq!(page.objects[0].obj, ManagedRef::new("Datacenter", "datacenter-2"));
        assert_eq!(page.objects[0].name.as_deref(), Some("DC & Lab"));
        Ok(())
    }

    #[test]
    fn test_names_keep_surrounding_spaces() -> Result<()> {
        let body = envelope(concat!(
            r#"<RetrievePropertiesExResponse xmlns="urn:vim25"><returnval>"#,
            "\n  <objects>\n    <obj type=\"Datastore\">datastore-7</obj>\n",
            "    <propSet><name>name</name><val xsi:type=\"xsd:string\"> ds 1 </val></propSet>\n",
            "  </objects>\n</returnval></RetrievePropertiesExResponse>"
        ));
        let page = parse_retrieve_page(&parse_document(&body)?)?;
        assert_eq!(page.objects.len(), 1);
        assert_eq!(page.objects[0].obj.value, "datastore-7");
        assert_eq!(page.objects[0].name.as_deref(), Some(" ds 1 "));
        assert!(page.token.is_none());
        Ok(())
    }

    #[test]
    fn test_empty_result_has_no_objects() -> Result<()> {
        let body = envelope(r#"<RetrievePropertiesExResponse xmlns="urn:vim25"/>"#);
        let page = parse_retrieve_page(&parse_document(&body)?)?;
        assert!(page.objects.is_empty());
        assert!(page.token.is_none());
        Ok(())
    }

    #[test]
    fn test_invalid_login_fault() -> Result<()> {
        let root = parse_document(INVALID_LOGIN)?;
        match fault(&root) {
            Some(ResolverError::AuthenticationRejected(msg)) => {
                assert!(msg.contains("incorrect user name"))
            }
            other => panic!("unexpected fault: {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_other_fault_is_soap_error() -> Result<()> {
        let body = envelope(concat!(
            "<soapenv:Fault><faultcode>ServerFaultCode</faultcode>",
            "<faultstring>The object has already been deleted</faultstring>",
            r#"<detail><ManagedObjectNotFoundFault xmlns="urn:vim25"/></detail>"#,
            "</soapenv:Fault>"
        ));
        let root = parse_document(&body)?;
        match fault(&root) {
            Some(ResolverError::Soap { code, message }) => {
                assert_eq!(code, "ServerFaultCode");
                assert!(message.contains("ManagedObjectNotFound"));
            }
            other => panic!("unexpected fault: {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_login_escapes_credentials() {
        let sm = ManagedRef::new("SessionManager", "SessionManager");
        let body = login(&sm, "admin@vsphere.local", "p<a>ss&");
        assert!(body.contains("<password>p&lt;a&gt;ss&amp;</password>"));
        assert!(body.contains(r#"<_this type="SessionManager">SessionManager</_this>"#));
    }

    #[test]
    fn test_container_view_request() {
        let body = create_container_view(
            &ManagedRef::new("ViewManager", "ViewManager"),
            &ManagedRef::new("Folder", "group-d1"),
            &["Datacenter"],
            true,
        );
        assert!(body.contains(r#"<container type="Folder">group-d1</container>"#));
        assert!(body.contains("<type>Datacenter</type><recursive>true</recursive>"));
    }

    #[test]
    fn test_truncated_document() {
        assert!(parse_document("<a><b></b>").is_err());
    }
}
