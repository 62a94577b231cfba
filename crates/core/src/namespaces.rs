//! XML namespace URIs for the feed dialects and extension vocabularies.

pub const ATOM_03: &str = "http://purl.org/atom/ns#";
pub const ATOM_10: &str = "http://www.w3.org/2005/Atom";
pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RSS_090: &str = "http://my.netscape.com/rdf/simple/0.9/";
pub const RSS_10: &str = "http://purl.org/rss/1.0/";
pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
pub const XHTML: &str = "http://www.w3.org/1999/xhtml";

pub const DUBLIN_CORE_10: &str = "http://purl.org/dc/elements/1.0/";
pub const DUBLIN_CORE_11: &str = "http://purl.org/dc/elements/1.1/";
pub const CONTENT: &str = "http://purl.org/rss/1.0/modules/content/";
pub const SLASH: &str = "http://purl.org/rss/1.0/modules/slash/";
pub const THREAD: &str = "http://purl.org/syndication/thread/1.0";
pub const WELL_FORMED_WEB: &str = "http://wellformedweb.org/CommentAPI/";
pub const ITUNES: &str = "http://www.itunes.com/dtds/podcast-1.0.dtd";
pub const CREATIVE_COMMONS: &str = "http://backend.userland.com/creativeCommonsRssModule";
pub const SYNDICATION: &str = "http://purl.org/rss/1.0/modules/syndication/";
