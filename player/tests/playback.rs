use std::io::{self, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use player::{
    encode_frame, run_read_loop, Cancel, MemoryTransport, MoviePlayer, PlayerConfig, TcpTransport,
    DRAW_STATE_TAG,
};
use scene::{
    Collaborators, NullSink, PlayerList, RecordingSink, SceneConfig, SpriteTable, StateStore,
    TimelineConfig,
};
use wire::{encode_draw_message, DrawMessage, FrameHeader};

fn frame(n: u32) -> Vec<u8> {
    encode_draw_message(&DrawMessage {
        header: FrameHeader {
            ack_cmd: 0,
            ack: n,
            resend: n + 1,
        },
        info_text: format!("frame {n}"),
        sounds: vec![n as u16],
        ..DrawMessage::default()
    })
    .unwrap()
}

fn movie(len: u32) -> Arc<MoviePlayer> {
    let store = Arc::new(StateStore::new(SceneConfig::for_testing()));
    Arc::new(MoviePlayer::new(
        store,
        (1..=len).map(frame).collect(),
        Arc::new(SpriteTable::new()),
        Arc::new(PlayerList::new()),
        PlayerConfig::for_testing(),
        TimelineConfig::for_testing(),
    ))
}

#[test]
fn read_loop_applies_draw_state_and_stops_on_fatal_error() {
    let mut transport = MemoryTransport::new();
    transport.push(DRAW_STATE_TAG, frame(1));
    transport.push_error(io::ErrorKind::TimedOut);
    transport.push(99, vec![1, 2, 3]);
    transport.push(DRAW_STATE_TAG, vec![0xFF]);
    transport.push_error(io::ErrorKind::WouldBlock);
    transport.push(DRAW_STATE_TAG, frame(2));
    transport.push_error(io::ErrorKind::ConnectionReset);

    let store = StateStore::new(SceneConfig::for_testing());
    let sprites = SpriteTable::new();
    let players = PlayerList::new();
    let mut sink = RecordingSink::new();
    let err = run_read_loop(
        &mut transport,
        &store,
        Collaborators::new(&sprites, &players),
        &mut sink,
        &Cancel::new(),
        &PlayerConfig::for_testing(),
    )
    .unwrap_err();

    assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
    assert_eq!(store.frame(), 3);
    assert_eq!(store.capture().info_text, "frame 2");
    assert_eq!(store.capture().ack.ack, 2);
    assert_eq!(sink.chat_lines().count(), 0);
}

#[test]
fn read_loop_returns_when_cancelled() {
    let store = Arc::new(StateStore::new(SceneConfig::for_testing()));
    let cancel = Cancel::new();

    let handle = {
        let store = Arc::clone(&store);
        let cancel = cancel.clone();
        thread::spawn(move || {
            let mut transport = MemoryTransport::new();
            transport.push(DRAW_STATE_TAG, frame(1));
            let sprites = SpriteTable::new();
            let players = PlayerList::new();
            let mut sink = NullSink;
            run_read_loop(
                &mut transport,
                &store,
                Collaborators::new(&sprites, &players),
                &mut sink,
                &cancel,
                &PlayerConfig::for_testing(),
            )
        })
    };

    while store.frame() == 0 {
        thread::sleep(Duration::from_millis(1));
    }
    cancel.cancel();
    let stats = handle.join().unwrap().unwrap();
    assert_eq!(stats.applied, 1);
    assert!(stats.timeouts > 0);
}

#[test]
fn tcp_transport_feeds_read_loop() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        for n in 1..=3 {
            stream
                .write_all(&encode_frame(DRAW_STATE_TAG, &frame(n)).unwrap())
                .unwrap();
        }
        stream.write_all(&encode_frame(7, b"chat").unwrap()).unwrap();
        // Dropping the stream closes the connection.
    });

    let config = PlayerConfig::for_testing();
    let mut transport =
        TcpTransport::connect(addr, config.read_timeout, config.max_frame_bytes).unwrap();
    let store = StateStore::new(SceneConfig::for_testing());
    let sprites = SpriteTable::new();
    let players = PlayerList::new();
    let mut sink = RecordingSink::new();
    let err = run_read_loop(
        &mut transport,
        &store,
        Collaborators::new(&sprites, &players),
        &mut sink,
        &Cancel::new(),
        &config,
    )
    .unwrap_err();
    server.join().unwrap();

    assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    assert_eq!(store.frame(), 3);
    assert_eq!(store.capture().info_text, "frame 3");
}

#[test]
fn movie_steps_and_seeks() {
    let player = movie(10);
    let mut sink = RecordingSink::new();
    for _ in 0..6 {
        player.step(&mut sink).unwrap().unwrap();
    }
    assert_eq!(player.position(), 6);
    assert_eq!(player.timeline().checkpoint_frames(), vec![0, 4]);

    let report = player.seek(9);
    assert_eq!(report.from, 4);
    assert_eq!(player.position(), 9);
    assert_eq!(player.store().capture().info_text, "frame 9");

    player.seek(2);
    assert_eq!(player.position(), 2);
    player.step(&mut sink).unwrap().unwrap();
    assert_eq!(player.store().capture().info_text, "frame 3");

    let before = sink.effects.len();
    player.seek(8);
    // Seeking is silent.
    assert_eq!(sink.effects.len(), before);
}

#[test]
fn movie_ticker_plays_to_end() {
    let player = movie(12);
    let handle = player.spawn_ticker(Box::new(NullSink), Cancel::new());
    assert_eq!(handle.join().unwrap(), 12);
    assert!(player.at_end());
    assert!(player.step(&mut NullSink).is_none());
}

#[test]
fn movie_ticker_stops_on_cancel() {
    let player = movie(10_000);
    let cancel = Cancel::new();
    let handle = player.spawn_ticker(Box::new(NullSink), cancel.clone());
    while player.position() < 3 {
        thread::sleep(Duration::from_millis(1));
    }
    cancel.cancel();
    let stepped = handle.join().unwrap();
    assert!(stepped >= 3);
    assert!(stepped < 10_000);
}

#[test]
fn movie_over_used_store_plays_from_first_frame() {
    let store = Arc::new(StateStore::new(SceneConfig::for_testing()));
    let (sprites, players) = (SpriteTable::new(), PlayerList::new());
    for n in [50, 51] {
        store
            .apply(
                &frame(n),
                Collaborators::new(&sprites, &players),
                &mut scene::Effects::live(&mut NullSink),
            )
            .unwrap();
    }
    assert_eq!(store.frame(), 2);

    let player = MoviePlayer::new(
        Arc::clone(&store),
        (1..=6).map(frame).collect(),
        Arc::new(SpriteTable::new()),
        Arc::new(PlayerList::new()),
        PlayerConfig::for_testing(),
        TimelineConfig::for_testing(),
    );
    assert_eq!(player.position(), 0);
    player.step(&mut NullSink).unwrap().unwrap();
    assert_eq!(store.capture().info_text, "frame 1");

    let report = player.seek(3);
    assert_eq!(player.position(), report.target);
    assert_eq!(store.capture().info_text, "frame 3");
}
