mod test_join_handshake;
mod test_live_count_tracks_membership;
