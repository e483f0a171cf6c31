mod test_signal_directedness;
