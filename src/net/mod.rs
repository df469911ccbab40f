mod transport;

pub use transport::{
    encode_request, HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError,
    TransportFuture, DEFAULT_TIMEOUT,
};
