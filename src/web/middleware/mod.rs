pub mod flow_session;
