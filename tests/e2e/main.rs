//! End-to-end scenarios: index a symbol database against a real git
//! working tree with substitute SRCSRV tools, then fetch the indexed
//! content back through a mock hosting server.

mod scenarios;
