mod test_snapshot_on_join;
