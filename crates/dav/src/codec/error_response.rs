//! Rendering a [`ProtocolError`] chain as the XML error document sent to clients.
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <D:error xmlns:D="DAV:" xmlns:m="http://apache.org/dav/xmlns" xmlns:C="svn:">
//! <C:error/>
//! <m:human-readable errcode="160013">
//! File not found: revision 12, path '/trunk/missing'
//! </m:human-readable>
//! </D:error>
//! ```
//!
//! Nodes are written outer to inner. A node contributes its condition element (if it is
//! tagged) followed by its description (if it has one).

use std::fmt::Write;

use http::header::CONTENT_TYPE;
use http::{HeaderValue, Response};

use crate::codec::xml::quote_text;
use crate::protocol::ProtocolError;

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

const ERROR_CONTENT_TYPE: &str = r#"text/xml; charset="utf-8""#;

/// Renders the whole chain as one error document.
pub fn render_error(err: &ProtocolError) -> String {
    let mut doc = String::with_capacity(256);
    doc.push_str(XML_HEADER);
    doc.push('\n');
    doc.push_str(r#"<D:error xmlns:D="DAV:""#);

    if err.iter().any(|node| node.description().is_some()) {
        doc.push_str(r#" xmlns:m="http://apache.org/dav/xmlns""#);
    }
    if let Some(namespace) = err.iter().find_map(ProtocolError::namespace) {
        let _ = write!(doc, r#" xmlns:C="{namespace}""#);
    }
    doc.push_str(">\n");

    for node in err {
        match (node.namespace(), node.tag()) {
            (Some(_), Some(tag)) => {
                let _ = writeln!(doc, "<C:{tag}/>");
            }
            (None, Some(tag)) => {
                let _ = writeln!(doc, "<D:{tag}/>");
            }
            _ => {}
        }

        if let Some(desc) = node.description() {
            let _ = write!(
                doc,
                "<m:human-readable errcode=\"{}\">\n{}\n</m:human-readable>\n",
                node.error_id(),
                quote_text(desc)
            );
        }
    }

    doc.push_str("</D:error>\n");
    doc
}

/// Builds the complete error response: the outermost node's status and the rendered
/// document.
pub fn error_response(err: &ProtocolError) -> Response<String> {
    let mut response = Response::new(render_error(err));
    *response.status_mut() = err.status();
    response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(ERROR_CONTENT_TYPE));
    response
}
