use groundlink::multispectral::*;

#[test]
fn test_command_format_validation() {
    // Valid: 9+6=15, both letters in the alphabet.
    let cmd = FilterCommand::parse("9R6G").expect("valid command");
    assert_eq!(cmd.duration1_s, 9);
    assert_eq!(cmd.filter1, 'R');
    assert_eq!(cmd.duration2_s, 6);
    assert_eq!(cmd.filter2, 'G');
    assert_eq!(cmd.total_duration_s(), 15);
    assert_eq!(cmd.to_string(), "9R6G");

    // Length.
    assert_eq!(
        FilterCommand::parse("9R6"),
        Err(CommandRejection::BadLength { len: 3 })
    );
    assert_eq!(
        FilterCommand::parse("9R6GX"),
        Err(CommandRejection::BadLength { len: 5 })
    );

    // Digits must be in [6,9].
    assert_eq!(
        FilterCommand::parse("5R9G"),
        Err(CommandRejection::BadDigit { position: 0, found: '5' })
    );
    assert_eq!(
        FilterCommand::parse("9RAG"),
        Err(CommandRejection::BadDigit { position: 2, found: 'A' })
    );

    // Durations must sum to exactly 15.
    assert_eq!(
        FilterCommand::parse("7R9G"),
        Err(CommandRejection::DurationSum { sum: 16 })
    );
    // Letters valid but 8+8=16: still a sum rejection.
    assert_eq!(
        FilterCommand::parse("8R8B"),
        Err(CommandRejection::DurationSum { sum: 16 })
    );

    // Filter letters must come from the fixed alphabet.
    assert_eq!(
        FilterCommand::parse("9X6G"),
        Err(CommandRejection::BadFilterLetter { position: 1, found: 'X' })
    );
    assert_eq!(
        FilterCommand::parse("9R6Z"),
        Err(CommandRejection::BadFilterLetter { position: 3, found: 'Z' })
    );
}

#[test]
fn test_acceptance_gated_on_separation_latch() {
    let mut sequencer = MultiSpectralSequencer::new();
    assert_eq!(sequencer.state(), SequencerState::AwaitingSeparation);

    // Perfectly valid command, but separation has not been observed.
    assert_eq!(
        sequencer.submit("9R6G", 0),
        Err(CommandRejection::NotSeparated)
    );

    sequencer.mark_separation();
    assert_eq!(sequencer.state(), SequencerState::Ready);

    let motor = sequencer.submit("9R6G", 0).expect("accepted after latch");
    assert_eq!(sequencer.state(), SequencerState::Executing);
    assert_eq!(motor.encode(), "!M1:9:R:1000;M2:6:G:1000!");
}

#[test]
fn test_reentrancy_guard_rejects_everything_in_flight() {
    let mut sequencer = MultiSpectralSequencer::new();
    sequencer.mark_separation();
    sequencer.submit("9R6G", 0).unwrap();

    // The same valid command again.
    assert_eq!(
        sequencer.submit("9R6G", 100),
        Err(CommandRejection::AlreadyInFlight)
    );
    // Even garbage is rejected with AlreadyInFlight, not a format error.
    assert_eq!(
        sequencer.submit("zzzz", 100),
        Err(CommandRejection::AlreadyInFlight)
    );
}

#[test]
fn test_completion_ack_returns_to_ready() {
    let mut sequencer = MultiSpectralSequencer::new();
    sequencer.mark_separation();
    sequencer.submit("6B9C", 0).unwrap();

    let finished = sequencer.on_sequence_complete().expect("was in flight");
    assert_eq!(finished.to_string(), "6B9C");
    assert_eq!(sequencer.state(), SequencerState::Ready);
    assert!(sequencer.in_flight().is_none());

    // Separation is a one-way latch: a new command starts immediately.
    assert!(sequencer.submit("7Y8M", 0).is_ok());

    // A stray completion ack with nothing in flight is a no-op.
    sequencer.on_sequence_complete();
    assert!(sequencer.on_sequence_complete().is_none());
}

#[test]
fn test_countdown_is_a_projection_only() {
    let mut sequencer = MultiSpectralSequencer::new();
    sequencer.mark_separation();
    assert!(sequencer.remaining_s(0).is_none());

    sequencer.submit("9R6G", 10_000).unwrap();
    assert_eq!(sequencer.remaining_s(10_000), Some(15));
    assert_eq!(sequencer.remaining_s(17_000), Some(8));
    assert_eq!(sequencer.remaining_s(25_000), Some(0));

    // Local expiry does NOT complete the command; only the vehicle ack does.
    assert_eq!(sequencer.remaining_s(60_000), Some(0));
    assert_eq!(sequencer.state(), SequencerState::Executing);
    assert_eq!(
        sequencer.submit("9R6G", 60_000),
        Err(CommandRejection::AlreadyInFlight)
    );
}

#[test]
fn test_stats_track_outcomes() {
    let mut sequencer = MultiSpectralSequencer::new();
    sequencer.mark_separation();

    let _ = sequencer.submit("7R9G", 0); // rejected: sum
    let _ = sequencer.submit("9R6G", 0); // accepted
    let _ = sequencer.submit("6C9F", 0); // rejected: in flight
    sequencer.on_sequence_complete();

    let stats = sequencer.stats();
    assert_eq!(stats.submitted, 3);
    assert_eq!(stats.accepted, 1);
    assert_eq!(stats.rejected, 2);
    assert_eq!(stats.completed, 1);
}

#[test]
fn test_every_alphabet_letter_is_accepted() {
    for letter in FILTER_ALPHABET {
        let raw = format!("9{letter}6{letter}");
        assert!(FilterCommand::parse(&raw).is_ok(), "letter {letter}");
    }
}
