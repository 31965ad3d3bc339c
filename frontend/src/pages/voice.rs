use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::SpeechRecognition;
use yew::prelude::*;

use crate::api::{self, Entry, VoiceItem, VoiceResponse};
use crate::format::format_currency;
use crate::toast::ToastHandle;
use crate::{icon_mic, page_shell};

#[derive(Clone, Copy, PartialEq, Eq)]
enum CaptureState {
    Idle,
    Recording,
    Processing,
}

/// Start browser speech recognition, feeding the final transcript and the
/// end-of-session signal back through callbacks. Returns `None` where the
/// API is unavailable; the page falls back to the typed transcript box.
fn start_recognition(
    on_transcript: Callback<String>,
    on_end: Callback<()>,
) -> Option<SpeechRecognition> {
    let recognition = SpeechRecognition::new().ok()?;
    recognition.set_lang("en-IN");
    recognition.set_interim_results(false);

    let result_handler = Closure::<dyn FnMut(web_sys::SpeechRecognitionEvent)>::new(
        move |event: web_sys::SpeechRecognitionEvent| {
            let mut transcript = String::new();
            if let Some(results) = event.results() {
            for index in 0..results.length() {
                if let Some(result) = results.get(index) {
                    if let Some(alternative) = result.get(0) {
                        transcript.push_str(&alternative.transcript());
                    }
                }
            }
            }
            if !transcript.trim().is_empty() {
                on_transcript.emit(transcript.trim().to_string());
            }
        },
    );
    recognition.set_onresult(Some(result_handler.as_ref().unchecked_ref()));
    result_handler.forget();

    let end_handler = Closure::<dyn FnMut()>::new(move || {
        on_end.emit(());
    });
    recognition.set_onend(Some(end_handler.as_ref().unchecked_ref()));
    end_handler.forget();

    let _ = recognition.start();
    Some(recognition)
}

#[function_component(VoiceEntryPage)]
pub fn voice_entry_page() -> Html {
    let toast = use_context::<ToastHandle>().unwrap_or_default();

    let state = use_state(|| CaptureState::Idle);
    let transcript = use_state(|| "".to_string());
    let result = use_state(|| None::<(Entry, Vec<VoiceItem>)>);
    let recognition = use_mut_ref(|| None::<SpeechRecognition>);

    let on_toggle_mic = {
        let state = state.clone();
        let transcript = transcript.clone();
        let recognition = recognition.clone();
        let toast = toast.clone();
        Callback::from(move |_| {
            if *state == CaptureState::Recording {
                if let Some(rec) = recognition.borrow_mut().take() {
                    let _ = rec.stop();
                }
                state.set(CaptureState::Idle);
                return;
            }

            let on_transcript = {
                let transcript = transcript.clone();
                Callback::from(move |text: String| transcript.set(text))
            };
            let on_end = {
                let state = state.clone();
                Callback::from(move |_| state.set(CaptureState::Idle))
            };

            match start_recognition(on_transcript, on_end) {
                Some(rec) => {
                    *recognition.borrow_mut() = Some(rec);
                    state.set(CaptureState::Recording);
                }
                None => {
                    toast.info("Speech recognition is not available in this browser. Type the transcript instead.");
                }
            }
        })
    };

    let on_process = {
        let state = state.clone();
        let transcript = transcript.clone();
        let result = result.clone();
        let toast = toast.clone();
        Callback::from(move |_| {
            let text = transcript.trim().to_string();
            if text.is_empty() {
                toast.error("Say or type what happened first.");
                return;
            }
            if *state == CaptureState::Processing {
                return;
            }
            state.set(CaptureState::Processing);

            let state = state.clone();
            let transcript = transcript.clone();
            let result = result.clone();
            let toast = toast.clone();
            spawn_local(async move {
                let payload = serde_json::json!({ "transcript": text });
                match api::post_json::<VoiceResponse, _>("/api/voice/process", &payload).await {
                    Ok(resp) => {
                        result.set(Some((resp.entry, resp.items)));
                        transcript.set("".to_string());
                        toast.success("Entry recorded from voice.");
                    }
                    Err(msg) => toast.error(msg),
                }
                state.set(CaptureState::Idle);
            });
        })
    };

    let mic_label = match *state {
        CaptureState::Recording => "Listening... tap to stop",
        CaptureState::Processing => "Processing...",
        CaptureState::Idle => "Tap to speak",
    };

    let mic_class = if *state == CaptureState::Recording {
        "w-24 h-24 rounded-full bg-red-500 text-white flex items-center justify-center shadow-lg animate-pulse"
    } else {
        "w-24 h-24 rounded-full bg-[#173E63] text-white flex items-center justify-center shadow-lg hover:opacity-90 transition-all"
    };

    html! {
        { page_shell(
            "Voice Entry",
            html! {},
            html! {
                <>
                    <div class="bg-card rounded-[10px] p-8 border border-border flex flex-col items-center gap-4">
                        <button class={mic_class} onclick={on_toggle_mic} aria-label="Record voice entry" disabled={*state == CaptureState::Processing}>
                            { icon_mic() }
                        </button>
                        <p class="text-sm text-muted-foreground">{ mic_label }</p>
                        <p class="text-xs text-muted-foreground">{"Say something like \"5 kilo chawal 500 rupaye mein becha\"."}</p>
                    </div>

                    <div class="bg-card rounded-[10px] p-6 border border-border space-y-3">
                        <label class="text-[12px] font-bold text-muted-foreground">{"Transcript"}</label>
                        <textarea
                            rows="3"
                            placeholder="The transcript appears here; you can also type it."
                            value={(*transcript).clone()}
                            oninput={{
                                let transcript = transcript.clone();
                                Callback::from(move |e: InputEvent| {
                                    let input: web_sys::HtmlTextAreaElement = e.target_unchecked_into();
                                    transcript.set(input.value());
                                })
                            }}
                            class="w-full bg-[#f1f4f9] rounded-[10px] px-3 py-2 text-sm text-[#173E63] border-none"
                        />
                        <button onclick={on_process} class="bg-primary text-primary-foreground px-6 py-2 rounded-xl font-bold text-sm" disabled={*state == CaptureState::Processing}>
                            { if *state == CaptureState::Processing { "Processing..." } else { "Create Entry" } }
                        </button>
                    </div>

                    {
                        if let Some((entry, items)) = &*result {
                            html! {
                                <div class="bg-card rounded-[10px] p-6 border border-border space-y-3">
                                    <div class="flex items-center justify-between">
                                        <h3 class="font-bold text-foreground text-lg">{"Recorded"}</h3>
                                        <span class="bg-secondary text-secondary-foreground px-3 py-1 rounded-full text-[10px] font-bold uppercase">{ entry.entry_type.clone() }</span>
                                    </div>
                                    <p class="text-2xl font-bold text-[#1D617A]">{ format_currency(entry.amount) }</p>
                                    <p class="text-sm text-muted-foreground">{ entry.note.clone().unwrap_or_default() }</p>
                                    {
                                        if items.is_empty() {
                                            html! {}
                                        } else {
                                            html! {
                                                <ul class="space-y-1 pt-2 border-t border-border">
                                                    { for items.iter().map(|item| html! {
                                                        <li class="flex items-center justify-between text-sm">
                                                            <span class="text-foreground">{ format!("{} {} {}", item.quantity, item.unit, item.name) }</span>
                                                            <span class="text-muted-foreground">
                                                                { item.price.map(format_currency).unwrap_or_default() }
                                                            </span>
                                                        </li>
                                                    }) }
                                                </ul>
                                            }
                                        }
                                    }
                                </div>
                            }
                        } else {
                            html! {}
                        }
                    }
                </>
            }
        ) }
    }
}
