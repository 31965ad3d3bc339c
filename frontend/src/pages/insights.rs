use wasm_bindgen_futures::spawn_local;
use web_sys::InputEvent;
use yew::prelude::*;

use crate::api::{self, AskPoint, AskResponse, InsightsSummary, SummaryResponse};
use crate::format::format_currency;
use crate::toast::ToastHandle;
use crate::page_shell;

#[derive(Clone, PartialEq)]
enum ChatMessage {
    Question(String),
    Answer {
        title: String,
        value_label: String,
        points: Vec<AskPoint>,
    },
    Failure(String),
}

fn format_answer_value(resp: &AskResponse) -> String {
    match resp.value_format.as_str() {
        "number" => format!("{}", resp.value),
        "percent" => format!("{:.1}%", resp.value),
        _ => format_currency(resp.value),
    }
}

#[function_component(InsightsPage)]
pub fn insights_page() -> Html {
    let toast = use_context::<ToastHandle>().unwrap_or_default();

    let summary = use_state(|| None::<InsightsSummary>);
    let loading = use_state(|| true);

    let question = use_state(|| "".to_string());
    let chat = use_state(Vec::<ChatMessage>::new);
    let asking = use_state(|| false);

    {
        let summary = summary.clone();
        let loading = loading.clone();
        let toast = toast.clone();
        use_effect_with_deps(
            move |_| {
                spawn_local(async move {
                    match api::get_json::<SummaryResponse>("/api/insights/summary").await {
                        Ok(resp) => summary.set(Some(resp.summary)),
                        Err(msg) => toast.error(msg),
                    }
                    loading.set(false);
                });
                || ()
            },
            (),
        );
    }

    let on_ask = {
        let question = question.clone();
        let chat = chat.clone();
        let asking = asking.clone();
        Callback::from(move |_| {
            let text = question.trim().to_string();
            if text.is_empty() || *asking {
                return;
            }

            let mut next = (*chat).clone();
            next.push(ChatMessage::Question(text.clone()));
            chat.set(next);
            question.set("".to_string());
            asking.set(true);

            let chat = chat.clone();
            let asking = asking.clone();
            spawn_local(async move {
                let payload = serde_json::json!({ "question": text });
                let message = match api::post_json::<AskResponse, _>("/api/insights/ask", &payload).await {
                    Ok(resp) => ChatMessage::Answer {
                        title: resp.title.clone(),
                        value_label: format_answer_value(&resp),
                        points: resp.data.clone().unwrap_or_default(),
                    },
                    Err(msg) => ChatMessage::Failure(msg),
                };
                let mut next = (*chat).clone();
                next.push(message);
                chat.set(next);
                asking.set(false);
            });
        })
    };

    let cards = |s: &InsightsSummary| {
        html! {
            <>
                <div class="grid grid-cols-1 md:grid-cols-4 gap-6">
                    <MetricCard title="This Week In" value={format_currency(s.week_income)} />
                    <MetricCard title="This Week Out" value={format_currency(s.week_expenses)} />
                    <MetricCard title="Week Net" value={format_currency(s.week_net)} />
                    <MetricCard title="Net Cash" value={format_currency(s.net_cash)} />
                </div>

                <div class="grid grid-cols-1 lg:grid-cols-2 gap-6">
                    <div class="bg-card rounded-[10px] p-6 border border-border">
                        <div class="flex items-center justify-between mb-3">
                            <h3 class="font-bold text-foreground text-lg">{"Last 7 Days"}</h3>
                            <span class="text-xs text-muted-foreground">
                                { format!("Today: {} in / {} out", format_currency(s.today_income), format_currency(s.today_expenses)) }
                            </span>
                        </div>
                        {
                            if s.daily_trend.is_empty() {
                                html! { <p class="text-sm text-muted-foreground">{"No activity in the last week."}</p> }
                            } else {
                                let peak = s
                                    .daily_trend
                                    .iter()
                                    .map(|p| p.income.max(p.expense))
                                    .fold(0.0_f64, f64::max)
                                    .max(1.0);
                                html! {
                                    <div class="space-y-2">
                                        { for s.daily_trend.iter().map(|point| {
                                            let income_pct = (point.income / peak * 100.0) as i64;
                                            let expense_pct = (point.expense / peak * 100.0) as i64;
                                            html! {
                                                <div class="flex flex-col gap-1 text-sm">
                                                    <div class="flex items-center justify-between">
                                                        <span class="text-muted-foreground">{ point.day.clone() }</span>
                                                        <span class="text-xs text-muted-foreground">
                                                            { format!("{} / {}", format_currency(point.income), format_currency(point.expense)) }
                                                        </span>
                                                    </div>
                                                    <div class="h-2 w-full bg-secondary rounded-full overflow-hidden">
                                                        <div class="h-full bg-emerald-500" style={format!("width: {}%", income_pct)}></div>
                                                    </div>
                                                    <div class="h-2 w-full bg-secondary rounded-full overflow-hidden">
                                                        <div class="h-full bg-red-400" style={format!("width: {}%", expense_pct)}></div>
                                                    </div>
                                                </div>
                                            }
                                        }) }
                                    </div>
                                }
                            }
                        }
                    </div>

                    <div class="bg-card rounded-[10px] p-6 border border-border">
                        <h3 class="font-bold text-foreground text-lg mb-3">{"Where Entries Come From"}</h3>
                        {
                            if s.source_breakdown.is_empty() {
                                html! { <p class="text-sm text-muted-foreground">{"No entries recorded yet."}</p> }
                            } else {
                                html! {
                                    <ul class="space-y-2">
                                        { for s.source_breakdown.iter().map(|sc| html! {
                                            <li class="flex items-center justify-between text-sm">
                                                <span class="bg-secondary text-secondary-foreground px-3 py-1 rounded-full text-[10px] font-bold uppercase">{ sc.source.clone() }</span>
                                                <span class="font-semibold text-foreground">{ format!("{} entries", sc.count) }</span>
                                            </li>
                                        }) }
                                    </ul>
                                }
                            }
                        }
                    </div>
                </div>
            </>
        }
    };

    html! {
        { page_shell(
            "Insights",
            html! {},
            html! {
                <>
                    {
                        if *loading {
                            html! { <p class="text-sm text-muted-foreground">{"Loading..."}</p> }
                        } else if let Some(s) = &*summary {
                            cards(s)
                        } else {
                            html! { <p class="text-sm text-muted-foreground">{"Summary is unavailable right now."}</p> }
                        }
                    }

                    <div class="bg-card rounded-[10px] border border-border overflow-hidden">
                        <div class="p-5 border-b border-border">
                            <h3 class="font-bold text-foreground text-lg">{"Ask Ledgerly"}</h3>
                            <p class="text-xs text-muted-foreground mt-1">{"Try \"Aaj kitna kamaya\" or \"Total expense this week\"."}</p>
                        </div>
                        <div class="p-5 space-y-3 max-h-80 overflow-y-auto">
                            {
                                if chat.is_empty() {
                                    html! { <p class="text-sm text-muted-foreground">{"Ask a question about your ledger to get started."}</p> }
                                } else {
                                    html! {
                                        <>
                                            { for chat.iter().map(|message| match message {
                                                ChatMessage::Question(text) => html! {
                                                    <div class="flex justify-end">
                                                        <div class="bg-[#173E63] text-white rounded-2xl rounded-br-sm px-4 py-2 text-sm max-w-[75%]">{ text.clone() }</div>
                                                    </div>
                                                },
                                                ChatMessage::Answer { title, value_label, points } => html! {
                                                    <div class="flex justify-start">
                                                        <div class="bg-secondary rounded-2xl rounded-bl-sm px-4 py-3 text-sm max-w-[75%]">
                                                            <p class="text-xs text-muted-foreground">{ title.clone() }</p>
                                                            <p class="text-lg font-bold text-foreground">{ value_label.clone() }</p>
                                                            {
                                                                if points.is_empty() {
                                                                    html! {}
                                                                } else {
                                                                    html! {
                                                                        <ul class="mt-2 space-y-1">
                                                                            { for points.iter().map(|point| html! {
                                                                                <li class="flex items-center justify-between gap-6 text-xs">
                                                                                    <span class="text-muted-foreground">{ point.label.clone() }</span>
                                                                                    <span class="font-semibold">{ format_currency(point.value) }</span>
                                                                                </li>
                                                                            }) }
                                                                        </ul>
                                                                    }
                                                                }
                                                            }
                                                        </div>
                                                    </div>
                                                },
                                                ChatMessage::Failure(text) => html! {
                                                    <div class="flex justify-start">
                                                        <div class="bg-red-50 text-red-600 rounded-2xl rounded-bl-sm px-4 py-2 text-sm max-w-[75%]">{ text.clone() }</div>
                                                    </div>
                                                },
                                            }) }
                                        </>
                                    }
                                }
                            }
                        </div>
                        <div class="p-5 border-t border-border flex gap-3">
                            <input
                                placeholder="Ask about income, expenses, GST..."
                                value={(*question).clone()}
                                oninput={{
                                    let question = question.clone();
                                    Callback::from(move |e: InputEvent| {
                                        let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                                        question.set(input.value());
                                    })
                                }}
                                onkeydown={{
                                    let on_ask = on_ask.clone();
                                    Callback::from(move |e: KeyboardEvent| {
                                        if e.key() == "Enter" {
                                            on_ask.emit(());
                                        }
                                    })
                                }}
                                class="flex-1 p-2 border rounded"
                            />
                            <button
                                onclick={{
                                    let on_ask = on_ask.clone();
                                    Callback::from(move |_: MouseEvent| on_ask.emit(()))
                                }}
                                class="bg-primary text-primary-foreground px-4 py-2 rounded-xl font-bold text-sm"
                                disabled={*asking}
                            >
                                { if *asking { "Thinking..." } else { "Ask" } }
                            </button>
                        </div>
                    </div>
                </>
            }
        ) }
    }
}

#[derive(Properties, PartialEq)]
struct MetricCardProps {
    title: &'static str,
    value: String,
}

#[function_component(MetricCard)]
fn metric_card(props: &MetricCardProps) -> Html {
    html! {
        <div class="bg-card rounded-[10px] p-6 border border-border">
            <p class="text-sm text-muted-foreground mb-2">{ props.title }</p>
            <h3 class="text-2xl font-bold text-foreground">{ props.value.clone() }</h3>
        </div>
    }
}
