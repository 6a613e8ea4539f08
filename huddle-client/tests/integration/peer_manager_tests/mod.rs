mod test_candidate_buffering;
mod test_handshake_failures;
mod test_offer_on_peer_joined;
mod test_peer_left;
